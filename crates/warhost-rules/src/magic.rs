//! Specials, effects and skills.
//!
//! A special ability is pure data: damage entries, target filters, shield
//! coverage and defense bonuses. The battle engine interprets it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::combat::{AttackType, WeaponClass, WeaponFlags};

// =============================================================================
// Specials
// =============================================================================

bitflags! {
    /// What a special ability does.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SpecialFlags: u32 {
        /// Resolves its damage entries every time the bearer acts.
        const DAMAGE = 1 << 0;
        /// Raises shields for the bearer's army each round.
        const SHIELD = 1 << 1;
        /// Adds defense bonuses to the bearer once per battle.
        const DEFBONUS = 1 << 2;
        /// Targets inside buildings lose two points of defense.
        const NOBUILDING = 1 << 3;
        /// Narrates each damage entry separately.
        const DONT_COMBINE = 1 << 4;
        /// Damage counts and defense bonuses scale with the special level.
        const USE_LEVEL = 1 << 5;
    }
}

bitflags! {
    /// Which target filters of a special are active.
    ///
    /// `*_IF` filters require a match, `*_EXCEPT` filters forbid one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TargetFlags: u32 {
        /// Target must be inside one of the listed buildings.
        const BUILDING_IF = 1 << 0;
        /// Target must be inside a building not on the list.
        const BUILDING_EXCEPT = 1 << 1;
        /// Target race must be on the item list.
        const SOLDIER_IF = 1 << 2;
        /// Target race must not be on the item list.
        const SOLDIER_EXCEPT = 1 << 3;
        /// Target must be under one of the listed effects.
        const EFFECT_IF = 1 << 4;
        /// Target must be under none of the listed effects.
        const EFFECT_EXCEPT = 1 << 5;
        /// Target must ride a mount on the item list.
        const MOUNT_IF = 1 << 6;
        /// Target must ride a mount not on the item list.
        const MOUNT_EXCEPT = 1 << 7;
        /// Target must be an illusionary monster.
        const ILLUSION = 1 << 8;
        /// Target must not be a monster.
        const NO_MONSTER = 1 << 9;
    }
}

/// Attack types a shield covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldCoverage {
    /// One attack type.
    Only(AttackType),
    /// Every attack type.
    All,
}

impl ShieldCoverage {
    /// Returns true if this coverage blocks attacks of `attack_type`.
    #[must_use]
    pub fn covers(self, attack_type: AttackType) -> bool {
        match self {
            Self::Only(t) => t == attack_type,
            Self::All => true,
        }
    }
}

/// A flat defense change against one attack type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseMod {
    /// Attack type whose defense changes.
    pub attack_type: AttackType,
    /// Signed change.
    pub value: i32,
}

fn default_damage_class() -> WeaponClass {
    WeaponClass::MagicEnergy
}

/// One damage line of a special ability.
///
/// The number of attacks is `min + roll(value) + roll(value)`, with `value`
/// multiplied by the special level under [`SpecialFlags::USE_LEVEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEntry {
    /// Attack type defended against. `None` always hits and cannot be
    /// shielded.
    #[serde(default)]
    pub attack_type: Option<AttackType>,
    /// Guaranteed attacks.
    #[serde(default)]
    pub min: i32,
    /// Random attack magnitude.
    #[serde(default)]
    pub value: i32,
    /// Weapon flags applied to these attacks.
    #[serde(default)]
    pub flags: WeaponFlags,
    /// Damage class for armor saves.
    #[serde(default = "default_damage_class")]
    pub class: WeaponClass,
    /// Effect applied instead of a kill.
    #[serde(default)]
    pub effect: Option<String>,
}

/// A special ability table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialType {
    /// Unique key, referenced by skills, items, mounts and monsters.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: SpecialFlags,
    /// Active target filters.
    #[serde(default)]
    pub target_flags: TargetFlags,
    /// Object type names for the building filters.
    #[serde(default)]
    pub buildings: Vec<String>,
    /// Item abbreviations for the soldier and mount filters.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Effect names for the effect filters.
    #[serde(default)]
    pub effects: Vec<String>,
    /// Shield coverage raised under [`SpecialFlags::SHIELD`].
    #[serde(default)]
    pub shields: Vec<ShieldCoverage>,
    /// Defense bonuses granted under [`SpecialFlags::DEFBONUS`].
    #[serde(default)]
    pub defense_bonuses: Vec<DefenseMod>,
    /// Damage lines resolved under [`SpecialFlags::DAMAGE`].
    #[serde(default)]
    pub damage: Vec<DamageEntry>,
    /// Narration when the shield goes up: "casts {shield_desc}".
    #[serde(default)]
    pub shield_desc: String,
    /// Narration of the attack: "{name} {spell_desc}, ...".
    #[serde(default)]
    pub spell_desc: String,
    /// Narration before the tally: "..., {spell_desc2}{n}...".
    #[serde(default)]
    pub spell_desc2: String,
    /// Narration after the tally: "...{n}{spell_target}.".
    #[serde(default)]
    pub spell_target: String,
}

impl SpecialType {
    /// Creates an empty special with the given key.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            flags: SpecialFlags::empty(),
            target_flags: TargetFlags::empty(),
            buildings: Vec::new(),
            targets: Vec::new(),
            effects: Vec::new(),
            shields: Vec::new(),
            defense_bonuses: Vec::new(),
            damage: Vec::new(),
            shield_desc: String::new(),
            spell_desc: String::new(),
            spell_desc2: String::new(),
            spell_target: String::new(),
        }
    }
}

// =============================================================================
// Effects
// =============================================================================

bitflags! {
    /// Effect behaviour bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EffectFlags: u32 {
        /// Cleared when the affected soldier finishes its turn.
        const ONESHOT = 1 << 0;
        /// Modifies stats without marking the soldier as affected.
        const NOSET = 1 << 1;
    }
}

/// An effect table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectType {
    /// Unique name.
    pub name: String,
    /// Attack skill change.
    #[serde(default)]
    pub attack: i32,
    /// Defense changes.
    #[serde(default)]
    pub defense: Vec<DefenseMod>,
    /// Effect removed before this one is applied.
    #[serde(default)]
    pub cancel: Option<String>,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: EffectFlags,
}

// =============================================================================
// Skills
// =============================================================================

bitflags! {
    /// Skill behaviour bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SkillFlags: u32 {
        /// May be selected as a combat spell.
        const COMBAT = 1 << 0;
        /// A magic skill.
        const MAGIC = 1 << 1;
    }
}

fn default_max_level() -> i32 {
    5
}

/// A skill table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillType {
    /// Unique abbreviation.
    pub abbr: String,
    /// Display name.
    pub name: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: SkillFlags,
    /// Special ability cast when used as a combat spell.
    #[serde(default)]
    pub special: Option<String>,
    /// Highest attainable level.
    #[serde(default = "default_max_level")]
    pub max_level: i32,
}
