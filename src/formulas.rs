//! Combat formulas: hit chance, avoidance, mitigation, damage rolls, crits,
//! multi-attack checks, procs and elemental resists.
//!
//! Everything here is a pure function of its inputs plus, where a roll is
//! needed, the `RollSource` handed in by the caller. Out-of-range inputs are
//! clamped, never rejected.

use crate::config::{ClassId, Combatant, ElementType, Resists};
use crate::rng::RollSource;

/// Effective to-hit is capped here before the avoidance comparison
pub const TO_HIT_CAP: i32 = 550;
/// Block/parry/dodge/riposte chance for attacks from the front
pub const FRONT_AVOID_CHANCE: f64 = 0.08;
/// Weapon skill folded into to-hit
pub const WEAPON_SKILL_FOR_TO_HIT: i32 = 252;
/// Chance of a triple on a round that already doubled
pub const TRIPLE_ATTACK_CHANCE: f64 = 0.135;
/// Haste never pushes a weapon below one attack per second
pub const MIN_DELAY_DECISEC: f64 = 10.0;

pub const CRIT_MOD_NORMAL: i32 = 17;
pub const CRIT_MOD_CRIPPLING: i32 = 29;

// ----- Hit chance -----

/// Chance for `to_hit` to land against `avoidance`.
///
/// Both sides get +10; the attacker side is scaled by 1.21 and to-hit is
/// capped at [`TO_HIT_CAP`] first.
pub fn hit_chance(to_hit: i32, avoidance: i32) -> f64 {
    let a = (to_hit.min(TO_HIT_CAP) + 10) as f64 * 1.21;
    let b = (avoidance + 10) as f64;
    let chance = if a > b {
        1.0 - b / (a * 2.0)
    } else {
        a / (b * 2.0)
    };
    chance.clamp(0.0, 1.0)
}

/// Hit roll, then (from the front only) a second avoid roll.
pub fn roll_hit(to_hit: i32, avoidance: i32, from_behind: bool, rng: &mut impl RollSource) -> bool {
    if rng.roll() >= hit_chance(to_hit, avoidance) {
        return false;
    }
    if from_behind {
        return true;
    }
    rng.roll() >= FRONT_AVOID_CHANCE
}

// ----- Defender stats -----

/// NPC avoidance for the hit roll only
pub fn npc_avoidance(level: i32) -> i32 {
    let mut avoidance = level * 9 + 5;
    if level <= 50 && avoidance > 400 {
        avoidance = 400;
    } else if avoidance > 460 {
        avoidance = 460;
    }
    avoidance.max(1)
}

/// Mitigation for the damage roll only. Never used for the hit roll.
pub fn mitigation(mob_level: i32, mob_ac: Option<i32>, item_ac_bonus: i32, spell_ac_bonus: i32) -> i32 {
    let mut mit = if mob_level < 15 {
        let base = mob_level * 3;
        if mob_level < 3 {
            base + 2
        } else {
            base
        }
    } else {
        (mob_level * 41).div_euclid(10) - 15
    };
    if mit > 200 {
        mit = 200;
    }
    if let Some(ac) = mob_ac {
        if mit == 200 && ac > 200 {
            mit = ac;
        }
    }
    mit += (4 * item_ac_bonus).div_euclid(3) + spell_ac_bonus.div_euclid(4);
    mit.max(1)
}

// ----- Offense -----

/// STR contribution to offense rating
pub fn str_bonus(str: i32) -> i32 {
    if str >= 75 {
        (2 * str - 150).div_euclid(3)
    } else {
        0
    }
}

/// To-hit and offense rating of one combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffenseProfile {
    pub to_hit: i32,
    pub offense_skill: i32,
    pub offense_rating: i32,
    pub str_bonus: i32,
}

impl OffenseProfile {
    pub fn displayed_attack(&self) -> i32 {
        displayed_attack(self.offense_rating, self.to_hit)
    }
}

/// Melee to-hit and offense rating.
///
/// A bare `attack_rating` (no worn or spell attack given) stands in for
/// both to-hit and rating. Which of skill or rating the server really feeds
/// to-hit on that path is unsettled, so the two paths stay separate.
pub fn melee_offense(c: &Combatant) -> OffenseProfile {
    let skill = c.offense_skill_clamped();
    let strb = str_bonus(c.str);
    let legacy = match (c.attack_rating, c.worn_attack, c.spell_attack) {
        (Some(rating), None, None) => Some(rating),
        _ => None,
    };
    let (to_hit, offense_rating) = match legacy {
        Some(rating) => (rating + c.to_hit_bonus, rating + strb),
        None => (
            7 + skill + WEAPON_SKILL_FOR_TO_HIT + c.to_hit_bonus,
            skill + strb + c.worn_attack.unwrap_or(0) + c.spell_attack.unwrap_or(0),
        ),
    };
    OffenseProfile {
        to_hit,
        offense_skill: skill,
        offense_rating,
        str_bonus: strb,
    }
}

/// Archery to-hit and offense rating (no to-hit bonus, no legacy path)
pub fn ranged_offense(c: &Combatant) -> OffenseProfile {
    let skill = c.offense_skill_clamped();
    let strb = str_bonus(c.str);
    OffenseProfile {
        to_hit: 7 + skill + WEAPON_SKILL_FOR_TO_HIT,
        offense_skill: skill,
        offense_rating: skill + strb + c.worn_attack.unwrap_or(0) + c.spell_attack.unwrap_or(0),
        str_bonus: strb,
    }
}

/// The attack number the client shows
pub fn displayed_attack(offense_rating: i32, to_hit: i32) -> i32 {
    ((offense_rating + to_hit) as i64 * 1000).div_euclid(744) as i32
}

// ----- Damage roll -----

/// The d20-style damage index roll, returned as 1..=20.
pub fn roll_d20(offense_rating: i32, mitigation: i32, rng: &mut impl RollSource) -> i32 {
    let atk_roll = (rng.roll() * (offense_rating + 5) as f64).floor() as i64;
    let def_roll = (rng.roll() * (mitigation + 5) as f64).floor() as i64;
    let avg = ((offense_rating + mitigation + 10) as i64).div_euclid(2);
    if avg <= 0 {
        return 1;
    }
    let index = ((atk_roll - def_roll) + avg.div_euclid(2)).max(0);
    let index = ((index * 20) / avg).clamp(0, 19);
    index as i32 + 1
}

/// One melee damage roll: `(roll * base + 5) / 10`, at least 1, plus `damage_bonus`.
pub fn calc_melee_damage(
    base_damage: f64,
    offense_rating: i32,
    mitigation: i32,
    damage_bonus: i32,
    rng: &mut impl RollSource,
) -> i32 {
    let roll = roll_d20(offense_rating, mitigation, rng);
    let damage = ((roll as f64 * base_damage + 5.0) / 10.0).floor() as i32;
    damage.max(1) + damage_bonus
}

// ----- Damage multiplier -----

/// Level/class row of the damage multiplier table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplierParams {
    pub roll_chance: i32,
    pub max_extra: i32,
    pub minus_factor: i32,
}

pub fn damage_multiplier_params(level: i32, class: ClassId) -> MultiplierParams {
    let monk = class == ClassId::Monk;
    let (roll_chance, max_extra, minus_factor) = if monk && level >= 65 {
        (83, 300, 50)
    } else if level >= 65 || (monk && level >= 63) {
        (81, 295, 55)
    } else if level >= 63 || (monk && level >= 60) {
        (79, 290, 60)
    } else if level >= 60 || (monk && level >= 56) {
        (77, 285, 65)
    } else if level >= 56 {
        (72, 265, 70)
    } else if level >= 51 || monk {
        (65, 245, 80)
    } else {
        (51, 210, 105)
    };
    MultiplierParams {
        roll_chance,
        max_extra,
        minus_factor,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplierRoll {
    pub damage: i32,
    /// The roll scaled damage above 100%
    pub boosted: bool,
}

/// Applied to every client melee or archery hit.
pub fn roll_damage_multiplier(
    offense_rating: i32,
    damage: i32,
    level: i32,
    class: ClassId,
    is_archery: bool,
    rng: &mut impl RollSource,
) -> MultiplierRoll {
    let level = if level > 0 { level } else { 60 };
    let params = damage_multiplier_params(level, class);
    let base_bonus = (offense_rating - params.minus_factor).div_euclid(2).max(10);

    if rng.roll() * 100.0 < params.roll_chance as f64 {
        let roll = ((rng.roll() * (base_bonus + 1) as f64).floor() as i32 + 100).min(params.max_extra);
        let mut damage = (damage as i64 * roll as i64).div_euclid(100) as i32;
        if level >= 55 && damage > 1 && !is_archery && class == ClassId::Warrior {
            damage += 1;
        }
        return MultiplierRoll {
            damage: damage.max(1),
            boosted: roll > 100,
        };
    }
    MultiplierRoll {
        damage: damage.max(1),
        boosted: false,
    }
}

// ----- Critical hits -----

/// Inputs to the crit chance and crit roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CritInput {
    pub level: i32,
    pub class: ClassId,
    pub dex: i32,
    /// AA bonus, percent
    pub crit_chance_mult: f64,
    pub is_archery: bool,
    pub berserk: bool,
    /// Percent chance a crit becomes a crippling blow
    pub crippling_blow_chance: f64,
}

impl CritInput {
    pub fn melee(c: &Combatant) -> Self {
        Self {
            level: c.level,
            class: c.class,
            dex: c.dex,
            crit_chance_mult: c.crit_chance_mult,
            is_archery: false,
            berserk: false,
            crippling_blow_chance: 0.0,
        }
    }

    /// Archery always crits by ranger rules
    pub fn archery(c: &Combatant) -> Self {
        Self {
            class: ClassId::Ranger,
            is_archery: true,
            ..Self::melee(c)
        }
    }
}

/// Crit chance in percent, 0..=100
pub fn crit_chance(input: &CritInput, base_crit_chance: f64) -> f64 {
    let mut chance = base_crit_chance;
    let dex_cap = input.dex.min(255) as f64;
    let over_cap = if input.dex > 255 {
        (input.dex - 255) as f64 / 400.0
    } else {
        0.0
    };
    let aa = input.crit_chance_mult != 0.0;

    if input.class == ClassId::Warrior && input.level >= 12 {
        chance += 0.5 + dex_cap / 90.0 + over_cap;
    } else if input.is_archery && input.class == ClassId::Ranger && input.level > 16 {
        chance += 1.35 + dex_cap / 34.0 + over_cap * 2.0;
    } else if input.class != ClassId::Warrior && aa {
        chance += 0.275 + dex_cap / 150.0 + over_cap;
    }

    if aa {
        chance += chance * input.crit_chance_mult / 100.0;
    }
    chance.clamp(0.0, 100.0)
}

/// `((damage - bonus) * crit_mod + 5) / 10 + 8 + bonus`, +2 on a crippling blow
pub fn apply_crit_damage(damage: i32, damage_bonus: i32, crit_mod: i32, crippling: bool) -> i32 {
    let mut dmg = ((damage - damage_bonus) * crit_mod + 5).div_euclid(10) + 8 + damage_bonus;
    if crippling {
        dmg += 2;
    }
    dmg.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CritRoll {
    pub damage: i32,
    pub is_crit: bool,
}

/// Roll a crit on a hit that already landed.
pub fn roll_melee_crit(
    damage: i32,
    damage_bonus: i32,
    input: &CritInput,
    rng: &mut impl RollSource,
) -> CritRoll {
    let chance = crit_chance(input, 0.0);
    if chance <= 0.0 || rng.roll() >= chance / 100.0 {
        return CritRoll {
            damage,
            is_crit: false,
        };
    }

    let crippling = input.berserk
        || (input.crippling_blow_chance > 0.0 && rng.roll() * 100.0 < input.crippling_blow_chance);
    let crit_mod = if crippling {
        CRIT_MOD_CRIPPLING
    } else {
        CRIT_MOD_NORMAL
    };
    CritRoll {
        damage: apply_crit_damage(damage, damage_bonus, crit_mod, crippling),
        is_crit: true,
    }
}

// ----- Multi-attack -----

pub fn double_attack_effective(level: i32, double_attack_skill: i32) -> i32 {
    double_attack_skill + level
}

/// 1% per 5 effective points. Bards and beastlords never double.
pub fn check_double_attack(effective: i32, class: ClassId, rng: &mut impl RollSource) -> bool {
    if matches!(class, ClassId::Bard | ClassId::Beastlord) {
        return false;
    }
    effective as f64 > (rng.roll() * 500.0).floor()
}

pub fn can_triple_attack(level: i32, class: ClassId) -> bool {
    matches!(class, ClassId::Warrior | ClassId::Monk) && level >= 60
}

/// Only meaningful after a successful double. Skill plays no part.
pub fn check_triple_attack(level: i32, class: ClassId, rng: &mut impl RollSource) -> bool {
    can_triple_attack(level, class) && rng.roll() < TRIPLE_ATTACK_CHANCE
}

pub fn dual_wield_effective(level: i32, dual_wield_skill: i32, ambidexterity: i32) -> i32 {
    dual_wield_skill + level + ambidexterity
}

/// Dual wield chance in percent, as the off-hand proc scaling expects it
pub fn dual_wield_chance_percent(effective: i32) -> f64 {
    effective as f64 / 375.0 * 100.0
}

/// 1% per 3.75 effective points
pub fn check_dual_wield(effective: i32, rng: &mut impl RollSource) -> bool {
    effective as f64 > (rng.roll() * 375.0).floor()
}

// ----- Timing and procs -----

/// Hasted weapon delay, never below one second
pub fn effective_delay_decisec(delay: i32, haste_percent: f64) -> f64 {
    let haste_mod = (1.0 + haste_percent / 100.0).max(0.01);
    (delay as f64 / haste_mod).max(MIN_DELAY_DECISEC)
}

/// Proc chance for one swing, 0..=1
pub fn proc_chance_per_swing(
    effective_delay_decisec: f64,
    is_offhand: bool,
    dual_wield_chance: f64,
    dex: i32,
) -> f64 {
    if effective_delay_decisec <= 0.0 {
        return 0.0;
    }
    let mut chance = (0.0004166667 + 1.1437908496732e-5 * dex as f64) * effective_delay_decisec;
    if is_offhand {
        chance *= 50.0 / dual_wield_chance.max(1.0);
    }
    chance.clamp(0.0, 1.0)
}

/// Never consumes a roll when the chance is zero
pub fn check_proc(proc_chance: f64, rng: &mut impl RollSource) -> bool {
    proc_chance > 0.0 && rng.roll() < proc_chance
}

// ----- Elemental -----

/// Portion of `weapon_damage` that gets through `resist`
pub fn apply_elemental_resist(weapon_damage: i32, resist: i32, rng: &mut impl RollSource) -> i32 {
    if resist > 200 {
        return 0;
    }
    let roll = (rng.roll() * 201.0).floor() as i32 + 1 - resist;
    if roll < 1 {
        0
    } else if roll <= 99 {
        (weapon_damage as i64 * roll as i64).div_euclid(100) as i32
    } else {
        weapon_damage
    }
}

/// Elemental damage added by an optional add-on; no roll without one
pub fn elemental_damage(
    add_on: Option<(ElementType, i32)>,
    resists: &Resists,
    rng: &mut impl RollSource,
) -> i32 {
    match add_on {
        Some((kind, damage)) => apply_elemental_resist(damage, resists.get(kind), rng),
        None => 0,
    }
}

// ----- Damage bonus -----

pub fn is_warrior_class(class: ClassId) -> bool {
    matches!(
        class,
        ClassId::Warrior | ClassId::Ranger | ClassId::Paladin | ClassId::Shadowknight | ClassId::Bard
    )
}

/// Client main-hand damage bonus; `delay` is the unhasted weapon delay.
///
/// One-handers get the level term only. Two-handers add level- and
/// delay-scaled terms on top.
pub fn damage_bonus_client(level: i32, delay: i32, is_2h: bool) -> i32 {
    if level < 28 {
        return 0;
    }
    let mut bonus = 1 + (level - 28).div_euclid(3);
    if !is_2h {
        return bonus;
    }
    if delay <= 27 {
        return bonus + 1;
    }

    if level > 29 {
        let mut level_bonus = (level - 30).div_euclid(5) + 1;
        if level > 50 {
            level_bonus += 1;
            let mut level_bonus2 = level - 50;
            if level > 67 {
                level_bonus2 += 5;
            } else if level > 59 {
                level_bonus2 += 4;
            } else if level > 58 {
                level_bonus2 += 3;
            } else if level > 56 {
                level_bonus2 += 2;
            } else if level > 54 {
                level_bonus2 += 1;
            }
            level_bonus += (level_bonus2 * delay).div_euclid(40);
        }
        bonus += level_bonus;
    }

    if delay >= 40 {
        let mut delay_bonus = (delay - 40).div_euclid(3) + 1;
        if delay >= 45 {
            delay_bonus += 2;
        } else if delay >= 43 {
            delay_bonus += 1;
        }
        bonus += delay_bonus;
    }
    bonus
}

/// NPC damage bonus derived from its min/max hit
pub fn damage_bonus_npc(min_damage: i32, max_damage: i32) -> i32 {
    if min_damage > max_damage {
        return min_damage;
    }
    let di1k = ((max_damage - min_damage) as f64 * 1000.0) / 19.0;
    let di1k = ((di1k + 50.0) / 100.0).floor() * 100.0;
    let db = max_damage as f64 * 1000.0 - di1k * 20.0;
    (db / 1000.0).floor() as i32
}
