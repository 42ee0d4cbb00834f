//! Configuration structures for melee and ranged fight runs

use crate::error::ConfigError;
use crate::special::SpecialAttack;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Character class, as far as the combat math cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassId {
    Warrior,
    Monk,
    Rogue,
    Ranger,
    Bard,
    Beastlord,
    Paladin,
    Shadowknight,
    #[default]
    Other,
}

impl ClassId {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "warrior" => ClassId::Warrior,
            "monk" => ClassId::Monk,
            "rogue" => ClassId::Rogue,
            "ranger" => ClassId::Ranger,
            "bard" => ClassId::Bard,
            "beastlord" => ClassId::Beastlord,
            "paladin" => ClassId::Paladin,
            "shadowknight" | "shadow knight" => ClassId::Shadowknight,
            _ => ClassId::Other,
        }
    }
}

// Case-insensitive; anything unrecognised is `Other`
impl<'de> Deserialize<'de> for ClassId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ClassId::parse(&s))
    }
}

/// Elemental add-on damage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Fire,
    Cold,
    Poison,
    Disease,
    Magic,
}

impl<'de> Deserialize<'de> for ElementType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "fire" => Ok(ElementType::Fire),
            "cold" => Ok(ElementType::Cold),
            "poison" => Ok(ElementType::Poison),
            "disease" => Ok(ElementType::Disease),
            "magic" => Ok(ElementType::Magic),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["fire", "cold", "poison", "disease", "magic"],
            )),
        }
    }
}

/// A melee or ranged weapon. `delay` is in deciseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: i32,
    pub delay: i32,
    #[serde(default)]
    pub is_2h: bool,
    #[serde(default)]
    pub proc_spell: Option<String>,
    #[serde(default)]
    pub proc_spell_damage: i32,
    #[serde(default)]
    pub elem_type: Option<ElementType>,
    #[serde(default)]
    pub elem_damage: i32,
    /// Carried through from item data; the combat math ignores it.
    #[serde(default)]
    pub bane_damage: i32,
}

impl Weapon {
    pub fn new(damage: i32, delay: i32) -> Self {
        Self {
            damage,
            delay,
            is_2h: false,
            proc_spell: None,
            proc_spell_damage: 0,
            elem_type: None,
            elem_damage: 0,
            bane_damage: 0,
        }
    }

    pub fn has_proc(&self) -> bool {
        self.proc_spell.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn elemental(&self) -> Option<(ElementType, i32)> {
        match self.elem_type {
            Some(kind) if self.elem_damage > 0 => Some((kind, self.elem_damage)),
            _ => None,
        }
    }
}

/// Arrows: flat damage plus an optional elemental add-on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ammo {
    pub damage: i32,
    #[serde(default)]
    pub elem_type: Option<ElementType>,
    #[serde(default)]
    pub elem_damage: i32,
}

impl Ammo {
    pub fn new(damage: i32) -> Self {
        Self {
            damage,
            elem_type: None,
            elem_damage: 0,
        }
    }

    pub fn elemental(&self) -> Option<(ElementType, i32)> {
        match self.elem_type {
            Some(kind) if self.elem_damage > 0 => Some((kind, self.elem_damage)),
            _ => None,
        }
    }
}

/// Attacker stats. Every field has a default so partial YAML/JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Combatant {
    pub level: i32,
    pub class: ClassId,
    pub str: i32,
    pub dex: i32,
    /// Offense skill, 0-255 (clamped on use)
    pub offense_skill: i32,
    pub double_attack_skill: i32,
    pub dual_wield_skill: i32,
    pub ambidexterity: i32,
    pub haste_percent: f64,
    /// AA critical hit chance bonus, in percent
    pub crit_chance_mult: f64,
    pub to_hit_bonus: i32,
    pub worn_attack: Option<i32>,
    pub spell_attack: Option<i32>,
    /// Legacy combined attack value. Only honoured while worn and spell
    /// attack are both unset.
    pub attack_rating: Option<i32>,
    pub backstab_skill: i32,
    pub backstab_mod_percent: i32,
    /// Archery mastery AA rank, 1-3
    pub archery_mastery: i32,
}

impl Default for Combatant {
    fn default() -> Self {
        Self {
            level: 60,
            class: ClassId::Other,
            str: 255,
            dex: 255,
            offense_skill: 252,
            double_attack_skill: 0,
            dual_wield_skill: 0,
            ambidexterity: 0,
            haste_percent: 0.0,
            crit_chance_mult: 0.0,
            to_hit_bonus: 0,
            worn_attack: None,
            spell_attack: None,
            attack_rating: None,
            backstab_skill: 225,
            backstab_mod_percent: 0,
            archery_mastery: 2,
        }
    }
}

impl Combatant {
    pub fn offense_skill_clamped(&self) -> i32 {
        self.offense_skill.clamp(0, 255)
    }

    pub fn archery_mastery_clamped(&self) -> i32 {
        self.archery_mastery.clamp(1, 3)
    }
}

/// Per-element target resistances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resists {
    pub fire: i32,
    pub cold: i32,
    pub poison: i32,
    pub disease: i32,
    pub magic: i32,
}

impl Default for Resists {
    fn default() -> Self {
        Self {
            fire: 35,
            cold: 35,
            poison: 35,
            disease: 35,
            magic: 35,
        }
    }
}

impl Resists {
    pub fn get(&self, element: ElementType) -> i32 {
        match element {
            ElementType::Fire => self.fire,
            ElementType::Cold => self.cold,
            ElementType::Poison => self.poison,
            ElementType::Disease => self.disease,
            ElementType::Magic => self.magic,
        }
    }
}

/// The defender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub mob_level: i32,
    pub ac: Option<i32>,
    /// Overrides the NPC avoidance formula when set
    pub avoidance: Option<i32>,
    pub item_ac_bonus: i32,
    pub spell_ac_bonus: i32,
    pub resists: Resists,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            mob_level: 60,
            ac: None,
            avoidance: None,
            item_ac_bonus: 0,
            spell_ac_bonus: 0,
            resists: Resists::default(),
        }
    }
}

/// Full melee fight configuration loaded from YAML/JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightConfig {
    pub weapon1: Weapon,
    #[serde(default)]
    pub weapon2: Option<Weapon>,
    #[serde(default)]
    pub combatant: Combatant,
    #[serde(default)]
    pub target: Target,
    #[serde(default = "default_duration")]
    pub fight_duration_sec: f64,
    /// Skips block/parry/dodge/riposte; the hit roll still applies
    #[serde(default)]
    pub from_behind: bool,
    #[serde(default)]
    pub special_attacks: bool,
    /// Replaces the class special-attack table entry
    #[serde(default)]
    pub special_attack: Option<SpecialAttack>,
    #[serde(default)]
    pub fistweaving: bool,
    #[serde(default)]
    pub seed: Option<i64>,
}

fn default_duration() -> f64 {
    60.0
}

impl FightConfig {
    pub fn new(weapon1: Weapon) -> Self {
        Self {
            weapon1,
            weapon2: None,
            combatant: Combatant::default(),
            target: Target::default(),
            fight_duration_sec: default_duration(),
            from_behind: false,
            special_attacks: false,
            special_attack: None,
            fistweaving: false,
            seed: None,
        }
    }

    /// Load a fight configuration from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_file(path)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The special attack this run would use, before the from-behind check
    pub fn resolved_special_attack(&self) -> Option<SpecialAttack> {
        if !self.special_attacks {
            return None;
        }
        self.special_attack
            .clone()
            .or_else(|| SpecialAttack::for_class(self.combatant.class))
    }
}

/// Full ranged fight configuration loaded from YAML/JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedFightConfig {
    #[serde(default)]
    pub ranged_weapon: Option<Weapon>,
    #[serde(default)]
    pub arrow: Option<Ammo>,
    #[serde(default)]
    pub combatant: Combatant,
    #[serde(default)]
    pub target: Target,
    #[serde(default = "default_duration")]
    pub fight_duration_sec: f64,
    /// Stationary targets take double damage
    #[serde(default)]
    pub mob_stationary: bool,
    #[serde(default)]
    pub use_walled_mob_penalty: bool,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl RangedFightConfig {
    pub fn new(ranged_weapon: Weapon, arrow: Ammo) -> Self {
        Self {
            ranged_weapon: Some(ranged_weapon),
            arrow: Some(arrow),
            combatant: Combatant::default(),
            target: Target::default(),
            fight_duration_sec: default_duration(),
            mob_stationary: false,
            use_walled_mob_penalty: false,
            seed: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_file(path)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn load_file<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let content = fs::read_to_string(&path)?;
    let path_str = path.as_ref().to_string_lossy().to_lowercase();

    // JSON by extension, YAML otherwise
    if path_str.ends_with(".json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_fill_missing_fields() {
        let yaml = r#"
weapon1:
  damage: 10
  delay: 28
combatant:
  class: Warrior
  haste_percent: 40
target:
  ac: 300
"#;
        let config: FightConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.combatant.class, ClassId::Warrior);
        assert_eq!(config.combatant.level, 60);
        assert_eq!(config.combatant.dex, 255);
        assert_eq!(config.combatant.offense_skill, 252);
        assert_eq!(config.target.mob_level, 60);
        assert_eq!(config.target.resists.magic, 35);
        assert_eq!(config.fight_duration_sec, 60.0);
        assert!(config.weapon2.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn unknown_class_is_other() {
        assert_eq!(ClassId::parse("Cleric"), ClassId::Other);
        assert_eq!(ClassId::parse("SHADOWKNIGHT"), ClassId::Shadowknight);
    }

    #[test]
    fn elemental_needs_type_and_damage() {
        let mut w = Weapon::new(20, 30);
        assert!(w.elemental().is_none());
        w.elem_type = Some(ElementType::Fire);
        assert!(w.elemental().is_none());
        w.elem_damage = 12;
        assert_eq!(w.elemental(), Some((ElementType::Fire, 12)));
    }

    #[test]
    fn empty_proc_name_is_no_proc() {
        let mut w = Weapon::new(20, 30);
        w.proc_spell = Some(String::new());
        assert!(!w.has_proc());
        w.proc_spell = Some("Lifetap".into());
        assert!(w.has_proc());
    }

    #[test]
    fn ranged_json_without_arrow_loads() {
        let json = r#"{ "ranged_weapon": { "damage": 30, "delay": 40 } }"#;
        let config = RangedFightConfig::from_json(json).unwrap();
        assert!(config.arrow.is_none());
        assert_eq!(config.combatant.archery_mastery, 2);
    }
}
