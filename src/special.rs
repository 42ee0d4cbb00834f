//! Class special attacks (Flying Kick, Backstab) fired on their own cooldown

use crate::config::ClassId;
use serde::{Deserialize, Serialize};

/// Flying Kick base damage
pub const FLYING_KICK_BASE: i32 = 29;

/// How a special attack gets its pre-multiplier base damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialDamage {
    /// Primary weapon damage roll, optionally scaled
    Weapon {
        #[serde(default)]
        multiplier: Option<f64>,
    },
    /// Skill base, floored at `level * 4 / 5`
    Kick { base: i32 },
    /// Backstab skill scales the primary weapon's damage
    Backstab,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAttack {
    pub name: String,
    pub cooldown_decisec: i32,
    #[serde(default)]
    pub from_behind_only: bool,
    pub damage: SpecialDamage,
}

impl SpecialAttack {
    /// The class's built-in special, if it has one
    pub fn for_class(class: ClassId) -> Option<Self> {
        match class {
            ClassId::Monk => Some(Self {
                name: "Flying Kick".to_string(),
                cooldown_decisec: 80,
                from_behind_only: false,
                damage: SpecialDamage::Kick {
                    base: FLYING_KICK_BASE,
                },
            }),
            ClassId::Rogue => Some(Self {
                name: "Backstab".to_string(),
                cooldown_decisec: 120,
                from_behind_only: true,
                damage: SpecialDamage::Backstab,
            }),
            _ => None,
        }
    }

    pub fn usable(&self, from_behind: bool) -> bool {
        !self.from_behind_only || from_behind
    }

    pub fn is_backstab(&self) -> bool {
        self.damage == SpecialDamage::Backstab
    }
}

/// Backstab skill after the percentage mod, capped at 255
pub fn effective_backstab_skill(skill: i32, mod_percent: i32) -> i32 {
    ((skill as i64 * (100 + mod_percent) as i64).div_euclid(100) as i32).min(255)
}

/// Backstab base damage before the d20 roll
pub fn backstab_base(effective_skill: i32, weapon_damage: i32) -> i32 {
    ((effective_skill as f64 * 0.02 + 2.0) * weapon_damage as f64).floor() as i32
}

/// Floor on a landed backstab, applied after the crit
pub fn backstab_min_hit(level: i32) -> i32 {
    if level >= 60 {
        level * 2
    } else if level > 50 {
        (level * 3).div_euclid(2)
    } else {
        level
    }
}

/// Floor on a Flying Kick base roll
pub fn kick_min_damage(level: i32) -> i32 {
    (level * 4).div_euclid(5)
}
