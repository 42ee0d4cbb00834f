use dps_sim::{
    format_report, run_and_aggregate, run_fight, ClassId, ElementType, FightConfig, FightReport,
    SpecialAttack, SpecialDamage, Weapon,
};

fn baseline_warrior() -> FightConfig {
    // seed 1, L60 warrior, 10/28 weapon, AC 300, mob 60, 60 seconds
    let mut config = FightConfig::new(Weapon::new(10, 28));
    config.combatant.class = ClassId::Warrior;
    config.target.ac = Some(300);
    config.seed = Some(1);
    config
}

fn rogue_backstabber() -> FightConfig {
    let mut config = FightConfig::new(Weapon::new(20, 25));
    config.weapon2 = Some(Weapon::new(14, 20));
    config.combatant.class = ClassId::Rogue;
    config.combatant.double_attack_skill = 210;
    config.combatant.dual_wield_skill = 210;
    config.from_behind = true;
    config.special_attacks = true;
    config.fight_duration_sec = 600.0;
    config.seed = Some(7);
    config
}

fn all_hits(report: &FightReport) -> Vec<i32> {
    let mut hits = report.weapon1.hit_list.clone();
    hits.extend(&report.weapon2.hit_list);
    if let Some(special) = &report.special {
        hits.extend(&special.hit_list);
    }
    hits
}

fn summed_parts(report: &FightReport) -> i64 {
    let fist = report.fistweaving.as_ref().map_or(0, |fw| fw.total_damage);
    report.weapon1.total_damage
        + report.weapon1.proc_damage_total
        + report.weapon2.total_damage
        + report.weapon2.proc_damage_total
        + fist
}

#[test]
fn seeded_warrior_fight_is_deterministic() {
    let config = baseline_warrior();
    let a = run_fight(&config).unwrap();
    let b = run_fight(&config).unwrap();
    assert_eq!(a, b);
    assert_eq!(format_report(&a, None, None), format_report(&b, None, None));
    assert!(a.total_damage >= 0);
    assert_eq!(a.weapon1.rounds, 22);
}

#[test]
fn different_seeds_differ() {
    let mut config = baseline_warrior();
    config.fight_duration_sec = 600.0;
    let a = run_fight(&config).unwrap();
    config.seed = Some(2);
    let b = run_fight(&config).unwrap();
    assert_ne!(a.weapon1.hit_list, b.weapon1.hit_list);
}

#[test]
fn totals_add_up() {
    for config in [baseline_warrior(), rogue_backstabber()] {
        let report = run_fight(&config).unwrap();
        assert_eq!(report.total_damage, summed_parts(&report));
        assert_eq!(report.weapon1.hits as usize, report.weapon1.hit_list.len());
        assert_eq!(
            report.weapon1.rounds,
            report.weapon1.single + report.weapon1.double + report.weapon1.triple
        );
    }
}

#[test]
fn every_hit_is_at_least_one() {
    let report = run_fight(&rogue_backstabber()).unwrap();
    assert!(all_hits(&report).iter().all(|&h| h >= 1));
}

#[test]
fn main_hand_hits_include_the_damage_bonus() {
    let report = run_fight(&baseline_warrior()).unwrap();
    assert_eq!(report.damage_bonus, 11);
    assert!(report.weapon1.hit_list.iter().all(|&h| h >= 12));
    assert_eq!(report.damage_bonus_total, 11 * report.weapon1.hits as i64);
}

#[test]
fn backstab_respects_level_floor() {
    let report = run_fight(&rogue_backstabber()).unwrap();
    let special = report.special.expect("backstab should fire from behind");
    assert_eq!(special.name, "Backstab");
    assert_eq!(special.attempts, 50);
    assert!(special.hits > 0);
    assert!(special.hit_list.iter().all(|&h| h >= 120));
    assert!(special.backstab.is_some());
}

#[test]
fn rogues_dual_wield_but_never_triple() {
    let report = run_fight(&rogue_backstabber()).unwrap();
    assert!(report.weapon2.rounds > 0);
    assert_eq!(report.weapon2.triple, 0);
    assert_eq!(report.weapon1.triple, 0);
}

#[test]
fn bards_never_double() {
    let mut config = baseline_warrior();
    config.combatant.class = ClassId::Bard;
    config.combatant.double_attack_skill = 250;
    config.fight_duration_sec = 600.0;
    let report = run_fight(&config).unwrap();
    assert_eq!(report.weapon1.double, 0);
    assert_eq!(report.weapon1.triple, 0);
    assert_eq!(report.weapon1.swings, report.weapon1.rounds);
}

#[test]
fn flying_kick_on_cooldown() {
    let mut config = FightConfig::new(Weapon::new(12, 24));
    config.combatant.class = ClassId::Monk;
    config.special_attacks = true;
    config.seed = Some(99);
    let report = run_fight(&config).unwrap();
    let kick = report.special.unwrap();
    assert_eq!(kick.name, "Flying Kick");
    // ticks 0, 80, ..., 560
    assert_eq!(kick.attempts, 8);
    // floored at level*4/5 before the multiplier
    assert!(kick.hit_list.iter().all(|&h| h >= 48));
    assert!(kick.backstab.is_none());
}

#[test]
fn special_override_replaces_class_table() {
    let mut config = baseline_warrior();
    config.special_attacks = true;
    config.special_attack = Some(SpecialAttack {
        name: "Bash".into(),
        cooldown_decisec: 100,
        from_behind_only: false,
        damage: SpecialDamage::Weapon { multiplier: Some(2.0) },
    });
    let report = run_fight(&config).unwrap();
    let bash = report.special.unwrap();
    assert_eq!(bash.name, "Bash");
    assert_eq!(bash.attempts, 6);
}

#[test]
fn certain_procs_fire_on_every_hit() {
    // chance (0.0004166667 + 255 * 1.1437908496732e-5) * 300 > 1, clamped
    let mut weapon = Weapon::new(50, 300);
    weapon.proc_spell = Some("Test Nuke".into());
    weapon.proc_spell_damage = 100;
    let mut config = FightConfig::new(weapon);
    config.fight_duration_sec = 600.0;
    config.seed = Some(4);
    let report = run_fight(&config).unwrap();
    assert!(report.weapon1.hits > 0);
    assert_eq!(report.weapon1.procs, report.weapon1.hits);
    assert_eq!(report.weapon1.proc_damage_total, 100 * report.weapon1.hits as i64);
}

#[test]
fn high_resists_block_elemental_damage() {
    let mut weapon = Weapon::new(20, 30);
    weapon.elem_type = Some(ElementType::Fire);
    weapon.elem_damage = 15;
    let mut config = FightConfig::new(weapon);
    config.seed = Some(8);
    config.target.resists.fire = 250;
    assert_eq!(run_fight(&config).unwrap().elemental_damage_total, 0);

    config.target.resists.fire = 0;
    config.fight_duration_sec = 600.0;
    assert!(run_fight(&config).unwrap().elemental_damage_total > 0);
}

#[test]
fn fistweaving_report_section() {
    let mut weapon = Weapon::new(30, 40);
    weapon.is_2h = true;
    let mut config = FightConfig::new(weapon);
    config.combatant.class = ClassId::Monk;
    config.fistweaving = true;
    config.seed = Some(12);
    let report = run_fight(&config).unwrap();
    let fw = report.fistweaving.as_ref().unwrap();
    assert_eq!(fw.rounds, 15);
    assert_eq!(report.total_damage, summed_parts(&report));
    assert!(format_report(&report, None, None).contains("Fistweaving (9 dmg, no proc)"));
}

#[test]
fn yaml_config_round_trip_through_batch() {
    let yaml = r#"
weapon1:
  damage: 18
  delay: 26
combatant:
  class: warrior
  double_attack_skill: 245
target:
  ac: 300
fight_duration_sec: 30
seed: 10
"#;
    let config: FightConfig = serde_yaml::from_str(yaml).unwrap();
    let stats = run_and_aggregate(&config, 8, true).unwrap();
    assert_eq!(stats.runs, 8);
    assert!(stats.min_dps <= stats.avg_dps && stats.avg_dps <= stats.max_dps);
    assert!(stats.accuracy > 0.0 && stats.accuracy <= 100.0);
    assert_eq!(stats, run_and_aggregate(&config, 8, false).unwrap());
}
