//! Ranged (archery) fight engine: one shot timer, no off hand, no specials

use crate::config::{Ammo, ClassId, RangedFightConfig, Weapon};
use crate::error::{Result, SimError};
use crate::formulas::{
    calc_melee_damage, check_proc, effective_delay_decisec, elemental_damage, mitigation,
    npc_avoidance, proc_chance_per_swing, ranged_offense, roll_damage_multiplier, roll_hit,
    roll_melee_crit, CritInput, OffenseProfile,
};
use crate::rng::{CombatRng, RollSource, RANGED_PROC_STREAM_OFFSET};
use crate::simulation::{batch_seed, duration_ticks};
use crate::stats::{AggregatedStats, RangedFightReport};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Target AC when the config leaves it unset
pub const DEFAULT_RANGED_TARGET_AC: i32 = 300;
pub const WALL_PENALTY_CHANCE: f64 = 0.35;
pub const WALL_PENALTY_FACTOR: f64 = 0.5;

/// Damage multiplier for archery mastery ranks 1-3
pub fn archery_mastery_multiplier(rank: i32) -> f64 {
    match rank.clamp(1, 3) {
        1 => 1.30,
        2 => 1.60,
        _ => 2.00,
    }
}

/// Per-run values derived from a `RangedFightConfig`
#[derive(Debug, Clone)]
pub struct RangedSetup<'a> {
    pub bow: &'a Weapon,
    pub arrow: &'a Ammo,
    pub offense: OffenseProfile,
    pub avoidance: i32,
    pub mitigation: i32,
    /// `(bow + arrow) * mastery`, before the damage roll
    pub base_damage: f64,
    pub delay: f64,
    pub proc_chance: f64,
    pub crit: CritInput,
    pub duration_ticks: i64,
}

impl<'a> RangedSetup<'a> {
    pub fn new(config: &'a RangedFightConfig) -> Result<Self> {
        let (bow, arrow) = match (config.ranged_weapon.as_ref(), config.arrow.as_ref()) {
            (Some(bow), Some(arrow)) => (bow, arrow),
            _ => return Err(SimError::MissingRangedGear),
        };
        let c = &config.combatant;
        let base_damage =
            (bow.damage + arrow.damage) as f64 * archery_mastery_multiplier(c.archery_mastery_clamped());
        if base_damage < 1.0 {
            return Err(SimError::RangedDamageTooLow);
        }
        let duration_ticks = duration_ticks(config.fight_duration_sec)?;

        let t = &config.target;
        let ac = t.ac.unwrap_or(DEFAULT_RANGED_TARGET_AC);
        let delay = effective_delay_decisec(bow.delay, c.haste_percent);
        let proc_chance = if bow.has_proc() {
            proc_chance_per_swing(delay, false, 0.0, c.dex)
        } else {
            0.0
        };

        Ok(Self {
            bow,
            arrow,
            offense: ranged_offense(c),
            avoidance: t.avoidance.unwrap_or_else(|| npc_avoidance(t.mob_level)),
            mitigation: mitigation(t.mob_level, Some(ac), 0, 0),
            base_damage,
            delay,
            proc_chance,
            crit: CritInput::archery(c),
            duration_ticks,
        })
    }
}

/// Run one ranged fight with the config's own seed
pub fn run_ranged_fight(config: &RangedFightConfig) -> Result<RangedFightReport> {
    run_ranged_fight_with_seed(config, config.seed)
}

pub fn run_ranged_fight_with_seed(
    config: &RangedFightConfig,
    seed: Option<i64>,
) -> Result<RangedFightReport> {
    let (mut rng, mut proc_rng) = CombatRng::stream_pair(seed, RANGED_PROC_STREAM_OFFSET);
    run_ranged_fight_with_rng(config, &mut rng, &mut proc_rng)
}

/// Run one ranged fight on caller-supplied primary and proc streams.
///
/// Shots are always from behind, so only the hit roll can miss.
pub fn run_ranged_fight_with_rng<R: RollSource, P: RollSource>(
    config: &RangedFightConfig,
    rng: &mut R,
    proc_rng: &mut P,
) -> Result<RangedFightReport> {
    let setup = RangedSetup::new(config)?;
    let c = &config.combatant;
    let resists = &config.target.resists;
    debug!(
        to_hit = setup.offense.to_hit,
        offense_rating = setup.offense.offense_rating,
        base_damage = setup.base_damage,
        delay = setup.delay,
        "ranged fight setup"
    );

    let mut report = RangedFightReport {
        duration_sec: config.fight_duration_sec,
        wall_penalty_damage_lost: config.use_walled_mob_penalty.then_some(0),
        calculated_to_hit: setup.offense.to_hit,
        offense_skill: setup.offense.offense_skill,
        offense_rating: setup.offense.offense_rating,
        displayed_attack: setup.offense.displayed_attack(),
        ..Default::default()
    };

    let rating = setup.offense.offense_rating;
    let mut next_shot_at = 0.0;
    while next_shot_at < setup.duration_ticks as f64 {
        next_shot_at += setup.delay;

        if !roll_hit(setup.offense.to_hit, setup.avoidance, true, rng) {
            report.ranged.record_miss();
            trace!("shot missed");
            continue;
        }

        let dmg = calc_melee_damage(setup.base_damage, rating, setup.mitigation, 0, rng).max(1);
        let dmg = roll_damage_multiplier(rating, dmg, c.level, ClassId::Ranger, true, rng).damage;
        let crit = roll_melee_crit(dmg, 0, &setup.crit, rng);
        if crit.is_crit {
            report.crit_hits += 1;
            report.crit_damage_gain += (crit.damage - dmg) as i64;
        }
        let mut dmg = crit.damage;

        if config.mob_stationary {
            dmg *= 2;
        }
        if let Some(lost) = report.wall_penalty_damage_lost.as_mut() {
            if rng.roll() < WALL_PENALTY_CHANCE {
                let reduced = ((dmg as f64 * WALL_PENALTY_FACTOR).floor() as i32).max(1);
                *lost += (dmg - reduced) as i64;
                dmg = reduced;
            }
        }
        if check_proc(setup.proc_chance, proc_rng) {
            report.ranged.record_proc(setup.bow.proc_spell_damage);
            dmg += setup.bow.proc_spell_damage;
        }

        let elemental = elemental_damage(setup.bow.elemental(), resists, rng)
            + elemental_damage(setup.arrow.elemental(), resists, rng);
        report.elemental_damage_total += elemental as i64;
        dmg += elemental;

        report.ranged.record_hit(dmg);
        report.total_damage += dmg as i64;
        trace!(damage = dmg, crit = crit.is_crit, "shot hit");
    }

    report.finalize();
    debug!(
        total_damage = report.total_damage,
        shots = report.ranged.swings,
        "ranged fight done"
    );
    Ok(report)
}

pub fn run_ranged_batch(
    config: &RangedFightConfig,
    count: usize,
    parallel: bool,
) -> Result<Vec<RangedFightReport>> {
    if parallel {
        (0..count)
            .into_par_iter()
            .map(|i| run_ranged_fight_with_seed(config, batch_seed(config.seed, i)))
            .collect()
    } else {
        (0..count)
            .map(|i| run_ranged_fight_with_seed(config, batch_seed(config.seed, i)))
            .collect()
    }
}

pub fn run_ranged_and_aggregate(
    config: &RangedFightConfig,
    count: usize,
    parallel: bool,
) -> Result<AggregatedStats> {
    let results = run_ranged_batch(config, count, parallel)?;
    Ok(AggregatedStats::from_results(&results))
}
