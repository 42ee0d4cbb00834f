use dps_sim::{
    format_ranged_report, format_ranged_result, run_ranged_and_aggregate, run_ranged_fight, Ammo,
    ClassId, ElementType, RangedFightConfig, SimError, Weapon,
};

fn longbow() -> RangedFightConfig {
    let mut config = RangedFightConfig::new(Weapon::new(32, 40), Ammo::new(7));
    config.combatant.class = ClassId::Ranger;
    config.combatant.archery_mastery = 3;
    config.fight_duration_sec = 120.0;
    config.seed = Some(21);
    config
}

#[test]
fn zero_damage_gear_is_an_error() {
    let config = RangedFightConfig::new(Weapon::new(0, 30), Ammo::new(0));
    let result = run_ranged_fight(&config);
    assert_eq!(result, Err(SimError::RangedDamageTooLow));
    assert_eq!(
        format_ranged_result(&result),
        "Ranged weapon + arrow damage must be at least 1"
    );
}

#[test]
fn missing_bow_is_an_error() {
    let mut config = longbow();
    config.ranged_weapon = None;
    assert_eq!(run_ranged_fight(&config), Err(SimError::MissingRangedGear));
    assert!(run_ranged_and_aggregate(&config, 4, false).is_err());
}

#[test]
fn seeded_runs_repeat() {
    let config = longbow();
    let a = run_ranged_fight(&config).unwrap();
    let b = run_ranged_fight(&config).unwrap();
    assert_eq!(a, b);
    assert_eq!(format_ranged_report(&a), format_ranged_report(&b));
}

#[test]
fn shots_and_totals() {
    let report = run_ranged_fight(&longbow()).unwrap();
    // shots at 0, 40, ..., 1160
    assert_eq!(report.ranged.swings, 30);
    assert_eq!(report.ranged.rounds, 0);
    assert_eq!(report.total_damage, report.ranged.total_damage);
    assert!(report.ranged.hit_list.iter().all(|&h| h >= 1));
    assert_eq!(report.calculated_to_hit, 511);
}

#[test]
fn stationary_targets_take_double() {
    let moving = run_ranged_fight(&longbow()).unwrap();
    let mut config = longbow();
    config.mob_stationary = true;
    let stationary = run_ranged_fight(&config).unwrap();

    let doubled: Vec<i32> = moving.ranged.hit_list.iter().map(|h| h * 2).collect();
    assert_eq!(stationary.ranged.hit_list, doubled);
}

#[test]
fn wall_penalty_is_tracked() {
    let mut config = longbow();
    config.fight_duration_sec = 600.0;
    config.use_walled_mob_penalty = true;
    let report = run_ranged_fight(&config).unwrap();
    assert!(report.wall_penalty_damage_lost.unwrap() > 0);
    assert!(format_ranged_report(&report).contains("Damage lost to wall penalty: "));
}

#[test]
fn bow_and_arrow_elementals_stack() {
    let mut config = longbow();
    config.fight_duration_sec = 600.0;
    let mut bow = Weapon::new(32, 40);
    bow.elem_type = Some(ElementType::Cold);
    bow.elem_damage = 10;
    config.ranged_weapon = Some(bow);
    config.arrow = Some(Ammo {
        damage: 7,
        elem_type: Some(ElementType::Fire),
        elem_damage: 10,
    });
    config.target.resists.cold = 0;
    config.target.resists.fire = 300;
    let report = run_ranged_fight(&config).unwrap();
    let elemental = report.elemental_damage_total;
    assert!(elemental > 0);
    // fire is fully resisted, so cold alone caps it
    assert!(elemental <= 10 * report.ranged.hits as i64);
}

#[test]
fn batch_aggregates() {
    let stats = run_ranged_and_aggregate(&longbow(), 6, true).unwrap();
    assert_eq!(stats.runs, 6);
    assert!(stats.avg_dps > 0.0);
    assert!(stats.std_dps >= 0.0);
}
