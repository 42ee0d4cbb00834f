//! EverQuest-style melee and archery DPS simulator.
//!
//! Build a [`FightConfig`] or [`RangedFightConfig`], run it with
//! [`run_fight`] / [`run_ranged_fight`], then render the report with
//! [`format_report`] / [`format_ranged_report`].

pub mod config;
pub mod error;
pub mod formulas;
pub mod ranged;
pub mod report;
pub mod rng;
pub mod simulation;
pub mod special;
pub mod stats;

#[cfg(feature = "python")]
mod python;

pub use config::{Ammo, ClassId, Combatant, ElementType, FightConfig, RangedFightConfig, Resists, Target, Weapon};
pub use error::{ConfigError, SimError};
pub use ranged::{run_ranged_and_aggregate, run_ranged_batch, run_ranged_fight};
pub use report::{format_ranged_report, format_ranged_result, format_report};
pub use rng::{CombatRng, RollSource, ScriptedRolls};
pub use simulation::{run_and_aggregate, run_batch, run_fight};
pub use special::{SpecialAttack, SpecialDamage};
pub use stats::{AggregatedStats, FightReport, HitStats, RangedFightReport};
