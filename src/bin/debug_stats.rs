//! Debug script to print the derived combat numbers of a fight config

use dps_sim::formulas::{crit_chance, hit_chance};
use dps_sim::ranged::RangedSetup;
use dps_sim::simulation::MeleeSetup;
use dps_sim::{FightConfig, RangedFightConfig};
use std::env;

fn print_melee(config: &FightConfig) {
    let setup = match MeleeSetup::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let c = &config.combatant;
    println!("\n=== MELEE {:?} L{} ===", c.class, c.level);
    println!("  to_hit:          {}", setup.offense.to_hit);
    println!("  offense_rating:  {}", setup.offense.offense_rating);
    println!("  str_bonus:       {}", setup.offense.str_bonus);
    println!("  displayed_atk:   {}", setup.offense.displayed_attack());
    println!("  avoidance:       {}", setup.avoidance);
    println!("  mitigation:      {}", setup.mitigation);
    println!(
        "  hit chance:      {:.4} (from behind: {})",
        hit_chance(setup.offense.to_hit, setup.avoidance),
        config.from_behind
    );
    println!("  crit chance:     {:.2}%", crit_chance(&setup.crit, 0.0));
    println!("  damage_bonus:    {}", setup.damage_bonus);
    println!("  delay1:          {:.2}", setup.delay1);
    println!("  proc_chance1:    {:.4}", setup.proc_chance1);
    println!("  double_attack:   {:.1}%", setup.double_attack_effective as f64 / 5.0);
    if setup.dual_wielding {
        println!("  delay2:          {:.2}", setup.delay2);
        println!("  proc_chance2:    {:.4}", setup.proc_chance2);
        println!("  dual_wield:      {:.1}%", setup.dual_wield_chance);
    }
    if let Some(special) = &setup.special {
        println!("  special:         {} every {}ds", special.name, special.cooldown_decisec);
    }
    println!("  fistweaving:     {}", setup.fistweaving);
}

fn print_ranged(config: &RangedFightConfig) {
    let setup = match RangedSetup::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    println!("\n=== RANGED L{} ===", config.combatant.level);
    println!("  to_hit:          {}", setup.offense.to_hit);
    println!("  offense_rating:  {}", setup.offense.offense_rating);
    println!("  displayed_atk:   {}", setup.offense.displayed_attack());
    println!("  avoidance:       {}", setup.avoidance);
    println!("  mitigation:      {}", setup.mitigation);
    println!("  hit chance:      {:.4}", hit_chance(setup.offense.to_hit, setup.avoidance));
    println!("  crit chance:     {:.2}%", crit_chance(&setup.crit, 0.0));
    println!("  base damage:     {:.2}", setup.base_damage);
    println!("  delay:           {:.2}", setup.delay);
    println!("  proc_chance:     {:.4}", setup.proc_chance);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: debug_stats <config> [--ranged]");
        std::process::exit(1);
    }
    let config_path = &args[1];
    let ranged = args.iter().skip(2).any(|a| a == "--ranged");

    if ranged {
        match RangedFightConfig::from_file(config_path) {
            Ok(config) => print_ranged(&config),
            Err(e) => eprintln!("Error loading config: {}", e),
        }
    } else {
        match FightConfig::from_file(config_path) {
            Ok(config) => print_melee(&config),
            Err(e) => eprintln!("Error loading config: {}", e),
        }
    }
}
