//! Fight reports, hit statistics and batch aggregation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive statistics over one list of hit magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitStats {
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub median: f64,
    pub mode: i32,
}

impl HitStats {
    /// `None` for an empty list
    pub fn from_hits(hits: &[i32]) -> Option<Self> {
        let first = *hits.first()?;
        let min = *hits.iter().min()?;
        let max = *hits.iter().max()?;
        let sum: i64 = hits.iter().map(|&h| h as i64).sum();
        let mean = sum as f64 / hits.len() as f64;

        let mut sorted = hits.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 1 {
            sorted[mid] as f64
        } else {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        };

        // Mode moves only when a count strictly beats the best so far
        let mut counts: HashMap<i32, usize> = HashMap::new();
        let mut mode = first;
        let mut best = 0;
        for &h in hits {
            let count = counts.entry(h).or_insert(0);
            *count += 1;
            if *count > best {
                best = *count;
                mode = h;
            }
        }

        Some(Self {
            min,
            max,
            mean,
            median,
            mode,
        })
    }
}

/// Per-weapon tallies. Ranged shots reuse this with no round classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponReport {
    pub rounds: u32,
    pub swings: u32,
    pub hits: u32,
    pub total_damage: i64,
    pub max_damage: i32,
    pub min_damage: Option<i32>,
    pub hit_list: Vec<i32>,
    pub procs: u32,
    pub proc_damage_total: i64,
    pub single: u32,
    pub double: u32,
    pub triple: u32,
    pub hit_stats: Option<HitStats>,
}

impl WeaponReport {
    pub fn record_miss(&mut self) {
        self.swings += 1;
    }

    pub fn record_hit(&mut self, damage: i32) {
        self.swings += 1;
        self.hits += 1;
        self.total_damage += damage as i64;
        self.max_damage = self.max_damage.max(damage);
        self.min_damage = Some(self.min_damage.map_or(damage, |m| m.min(damage)));
        self.hit_list.push(damage);
    }

    pub fn record_proc(&mut self, damage: i32) {
        self.procs += 1;
        self.proc_damage_total += damage as i64;
    }

    /// Classify a finished round by how many attacks it made
    pub fn record_round(&mut self, attacks: u8) {
        match attacks {
            1 => self.single += 1,
            2 => self.double += 1,
            _ => self.triple += 1,
        }
    }

    /// Hits per swing, percent
    pub fn accuracy(&self) -> Option<f64> {
        (self.swings > 0).then(|| self.hits as f64 / self.swings as f64 * 100.0)
    }

    pub fn finalize(&mut self) {
        self.hit_stats = HitStats::from_hits(&self.hit_list);
    }
}

/// Extra state for a rogue's backstab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackstabReport {
    pub double_backstabs: u32,
    pub skill: i32,
    pub mod_percent: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialReport {
    pub name: String,
    pub attempts: u32,
    pub hits: u32,
    pub total_damage: i64,
    pub max_damage: i32,
    pub hit_list: Vec<i32>,
    pub hit_stats: Option<HitStats>,
    pub backstab: Option<BackstabReport>,
}

impl SpecialReport {
    pub fn record_hit(&mut self, damage: i32) {
        self.hits += 1;
        self.total_damage += damage as i64;
        self.max_damage = self.max_damage.max(damage);
        self.hit_list.push(damage);
    }
}

/// Monk fistweaving: a second unarmed round alongside a two-hander
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FistweavingReport {
    pub rounds: u32,
    pub swings: u32,
    pub hits: u32,
    pub total_damage: i64,
    pub max_damage: i32,
    pub single: u32,
    pub double: u32,
}

impl FistweavingReport {
    pub fn record_hit(&mut self, damage: i32) {
        self.swings += 1;
        self.hits += 1;
        self.total_damage += damage as i64;
        self.max_damage = self.max_damage.max(damage);
    }
}

/// Result of one melee fight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightReport {
    pub weapon1: WeaponReport,
    pub weapon2: WeaponReport,
    pub duration_sec: f64,
    pub total_damage: i64,
    pub elemental_damage_total: i64,
    /// Main-hand damage bonus per hit
    pub damage_bonus: i32,
    pub damage_bonus_total: i64,
    pub calculated_to_hit: i32,
    pub offense_skill: i32,
    pub offense_rating: i32,
    pub offense_rating_from_str: i32,
    pub displayed_attack: i32,
    pub crit_hits: u32,
    pub crit_damage_gain: i64,
    pub special: Option<SpecialReport>,
    pub fistweaving: Option<FistweavingReport>,
}

impl FightReport {
    pub fn finalize(&mut self) {
        self.weapon1.finalize();
        self.weapon2.finalize();
        if let Some(special) = self.special.as_mut() {
            special.hit_stats = HitStats::from_hits(&special.hit_list);
        }
    }
}

/// Result of one ranged fight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangedFightReport {
    pub ranged: WeaponReport,
    pub duration_sec: f64,
    pub total_damage: i64,
    pub elemental_damage_total: i64,
    pub crit_hits: u32,
    pub crit_damage_gain: i64,
    /// Present only when the wall penalty is enabled
    pub wall_penalty_damage_lost: Option<i64>,
    pub calculated_to_hit: i32,
    pub offense_skill: i32,
    pub offense_rating: i32,
    pub displayed_attack: i32,
}

impl RangedFightReport {
    pub fn finalize(&mut self) {
        self.ranged.finalize();
    }
}

/// What batch aggregation needs from any fight report
pub trait FightOutcome {
    fn total_damage(&self) -> i64;
    fn duration_sec(&self) -> f64;
    fn crit_hits(&self) -> u32;
    fn elemental_damage(&self) -> i64;
    /// (swings, hits) over every weapon
    fn swings_and_hits(&self) -> (u64, u64);

    fn dps(&self) -> f64 {
        self.total_damage() as f64 / self.duration_sec()
    }
}

impl FightOutcome for FightReport {
    fn total_damage(&self) -> i64 {
        self.total_damage
    }

    fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    fn crit_hits(&self) -> u32 {
        self.crit_hits
    }

    fn elemental_damage(&self) -> i64 {
        self.elemental_damage_total
    }

    fn swings_and_hits(&self) -> (u64, u64) {
        let mut swings = self.weapon1.swings as u64 + self.weapon2.swings as u64;
        let mut hits = self.weapon1.hits as u64 + self.weapon2.hits as u64;
        if let Some(special) = &self.special {
            swings += special.attempts as u64;
            hits += special.hits as u64;
        }
        if let Some(fw) = &self.fistweaving {
            swings += fw.swings as u64;
            hits += fw.hits as u64;
        }
        (swings, hits)
    }
}

impl FightOutcome for RangedFightReport {
    fn total_damage(&self) -> i64 {
        self.total_damage
    }

    fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    fn crit_hits(&self) -> u32 {
        self.crit_hits
    }

    fn elemental_damage(&self) -> i64 {
        self.elemental_damage_total
    }

    fn swings_and_hits(&self) -> (u64, u64) {
        (self.ranged.swings as u64, self.ranged.hits as u64)
    }
}

/// Summary over a batch of independent runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub runs: usize,
    pub avg_dps: f64,
    pub std_dps: f64,
    pub min_dps: f64,
    pub max_dps: f64,
    pub avg_total_damage: f64,
    pub avg_crit_hits: f64,
    pub avg_elemental_damage: f64,
    /// Hits per swing over the whole batch, percent
    pub accuracy: f64,
}

impl AggregatedStats {
    pub fn from_results<R: FightOutcome>(results: &[R]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let n = results.len() as f64;

        let dps: Vec<f64> = results.iter().map(|r| r.dps()).collect();
        let avg_dps = dps.iter().sum::<f64>() / n;
        let variance = dps.iter().map(|d| (d - avg_dps).powi(2)).sum::<f64>() / n;
        let min_dps = dps.iter().copied().fold(f64::INFINITY, f64::min);
        let max_dps = dps.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (swings, hits) = results
            .iter()
            .map(|r| r.swings_and_hits())
            .fold((0u64, 0u64), |(s, h), (rs, rh)| (s + rs, h + rh));

        Self {
            runs: results.len(),
            avg_dps,
            std_dps: variance.sqrt(),
            min_dps,
            max_dps,
            avg_total_damage: results.iter().map(|r| r.total_damage() as f64).sum::<f64>() / n,
            avg_crit_hits: results.iter().map(|r| r.crit_hits() as f64).sum::<f64>() / n,
            avg_elemental_damage: results.iter().map(|r| r.elemental_damage() as f64).sum::<f64>() / n,
            accuracy: if swings > 0 {
                hits as f64 / swings as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_stats_odd_and_even() {
        let odd = HitStats::from_hits(&[5, 1, 3]).unwrap();
        assert_eq!(odd.min, 1);
        assert_eq!(odd.max, 5);
        assert_eq!(odd.median, 3.0);
        assert_eq!(odd.mean, 3.0);

        let even = HitStats::from_hits(&[4, 1, 3, 2]).unwrap();
        assert_eq!(even.median, 2.5);
        assert_eq!(even.mean, 2.5);
    }

    #[test]
    fn mode_is_first_to_reach_top_count() {
        assert_eq!(HitStats::from_hits(&[1, 2, 2, 1]).unwrap().mode, 2);
        assert_eq!(HitStats::from_hits(&[7, 3, 9]).unwrap().mode, 7);
        assert_eq!(HitStats::from_hits(&[3, 7, 7, 3, 3]).unwrap().mode, 3);
    }

    #[test]
    fn empty_hits_have_no_stats() {
        assert!(HitStats::from_hits(&[]).is_none());
    }

    #[test]
    fn weapon_report_tallies() {
        let mut w = WeaponReport::default();
        w.record_miss();
        w.record_hit(12);
        w.record_hit(4);
        w.record_round(2);
        w.record_round(3);
        assert_eq!(w.swings, 3);
        assert_eq!(w.hits, 2);
        assert_eq!(w.min_damage, Some(4));
        assert_eq!(w.max_damage, 12);
        assert_eq!(w.double, 1);
        assert_eq!(w.triple, 1);
        assert!((w.accuracy().unwrap() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn aggregation_over_runs() {
        let mut a = RangedFightReport {
            duration_sec: 10.0,
            total_damage: 100,
            ..Default::default()
        };
        a.ranged.swings = 4;
        a.ranged.hits = 2;
        let mut b = a.clone();
        b.total_damage = 300;
        b.ranged.hits = 4;

        let agg = AggregatedStats::from_results(&[a, b]);
        assert_eq!(agg.runs, 2);
        assert_eq!(agg.avg_dps, 20.0);
        assert_eq!(agg.std_dps, 10.0);
        assert_eq!(agg.min_dps, 10.0);
        assert_eq!(agg.max_dps, 30.0);
        assert_eq!(agg.accuracy, 75.0);
    }
}
