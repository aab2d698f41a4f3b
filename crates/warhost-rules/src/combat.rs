//! Equipment and monster tables.
//!
//! Weapons, armor, mounts, monsters and battle items are all keyed by the
//! abbreviation of the item they describe. A table entry without a matching
//! catalog item is rejected when the ruleset loads.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// =============================================================================
// Attack types and weapon classes
// =============================================================================

/// The kind of attack being defended against.
///
/// Each soldier has one defense number per attack type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Ordinary melee.
    Combat,
    /// Energy magic.
    Energy,
    /// Spirit magic.
    Spirit,
    /// Weather magic.
    Weather,
    /// Mounted charges.
    Riding,
    /// Missile fire.
    Ranged,
}

impl AttackType {
    /// Number of attack types.
    pub const COUNT: usize = 6;

    /// All attack types in defense-array order.
    pub const ALL: [AttackType; Self::COUNT] = [
        Self::Combat,
        Self::Energy,
        Self::Spirit,
        Self::Weather,
        Self::Riding,
        Self::Ranged,
    ];

    /// Position of this attack type in defense arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Combat => 0,
            Self::Energy => 1,
            Self::Spirit => 2,
            Self::Weather => 3,
            Self::Riding => 4,
            Self::Ranged => 5,
        }
    }

    /// Magical attacks are blocked by shields and tear them down when they
    /// get through.
    #[must_use]
    pub const fn is_magical(self) -> bool {
        matches!(self, Self::Energy | Self::Spirit | Self::Weather)
    }

    /// Returns true if shields of this type exist at all.
    #[must_use]
    pub const fn is_shieldable(self) -> bool {
        matches!(
            self,
            Self::Energy | Self::Spirit | Self::Weather | Self::Ranged
        )
    }
}

/// Damage class of a weapon; armor saves are indexed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    /// Swords and axes.
    Slashing,
    /// Spears and arrows.
    Piercing,
    /// Maces and hammers.
    Crushing,
    /// Heavy two-handed blades.
    Cleaving,
    /// Crossbows and picks.
    ArmorPiercing,
    /// Magical energy.
    MagicEnergy,
    /// Magical spirit.
    MagicSpirit,
    /// Magical weather.
    MagicWeather,
}

impl WeaponClass {
    /// Number of weapon classes.
    pub const COUNT: usize = 8;

    /// Position of this class in armor save arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Slashing => 0,
            Self::Piercing => 1,
            Self::Crushing => 2,
            Self::Cleaving => 3,
            Self::ArmorPiercing => 4,
            Self::MagicEnergy => 5,
            Self::MagicSpirit => 6,
            Self::MagicWeather => 7,
        }
    }
}

// =============================================================================
// Weapons
// =============================================================================

bitflags! {
    /// Weapon behaviour bits. Special damage entries reuse them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct WeaponFlags: u32 {
        /// The wielder must know the weapon skill.
        const NEEDSKILL = 1 << 0;
        /// Always gets to swing; never too slow.
        const ALWAYSREADY = 1 << 1;
        /// The target's defense is ignored.
        const NODEFENSE = 1 << 2;
        /// Only usable while mounted.
        const NOFOOT = 1 << 3;
        /// Not usable while mounted.
        const NOMOUNT = 1 << 4;
        /// Short weapon; loses reach contests.
        const SHORT = 1 << 5;
        /// Long weapon; wins reach contests.
        const LONG = 1 << 6;
        /// Missile weapon; fires from the behind rank.
        const RANGED = 1 << 7;
        /// Skill does not add to the wielder's defense.
        const NOATTACKERSKILL = 1 << 8;
        /// Riding bonus adds to attack and defense.
        const RIDINGBONUS = 1 << 9;
        /// Riding bonus adds to defense only.
        const RIDINGBONUSDEFENSE = 1 << 10;
    }
}

/// How many attacks a weapon grants each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCount {
    /// A fixed count. Negative values mean one attack every `|n|` rounds.
    Fixed(i32),
    /// One attack per level of the weapon skill.
    Skill,
    /// One attack per two levels of the weapon skill, rounded up.
    HalfSkill,
}

impl Default for AttackCount {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

impl AttackCount {
    /// Resolves the count for a wielder of the given skill level.
    ///
    /// A zero result is raised to one.
    #[must_use]
    pub fn resolve(self, skill: i32) -> i32 {
        let n = match self {
            Self::Fixed(n) => n,
            Self::Skill => skill,
            Self::HalfSkill => (skill + 1) / 2,
        };
        if n == 0 {
            1
        } else {
            n
        }
    }
}

fn default_class() -> WeaponClass {
    WeaponClass::Slashing
}

fn default_attack_type() -> AttackType {
    AttackType::Combat
}

/// A weapon table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponType {
    /// Abbreviation of the weapon item.
    pub item: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: WeaponFlags,
    /// Skill used to wield the weapon.
    #[serde(default)]
    pub base_skill: Option<String>,
    /// Alternative skill; the better of the two is used.
    #[serde(default)]
    pub or_skill: Option<String>,
    /// Damage class for armor saves.
    #[serde(default = "default_class")]
    pub class: WeaponClass,
    /// Attack type the target defends with.
    #[serde(default = "default_attack_type")]
    pub attack_type: AttackType,
    /// Flat attack bonus.
    #[serde(default)]
    pub attack_bonus: i32,
    /// Flat defense bonus.
    #[serde(default)]
    pub defense_bonus: i32,
    /// Attack bonus against mounted targets.
    #[serde(default)]
    pub mount_bonus: i32,
    /// Attacks per round.
    #[serde(default)]
    pub attacks: AttackCount,
}

// =============================================================================
// Armor
// =============================================================================

bitflags! {
    /// Armor behaviour bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ArmorFlags: u32 {
        /// May be worn during an assassination.
        const USEINASSASSINATE = 1 << 0;
    }
}

/// An armor table entry.
///
/// A hit of class `c` is saved when a draw in `0..from` falls below
/// `saves[c]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorType {
    /// Abbreviation of the armor item.
    pub item: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: ArmorFlags,
    /// Divisor of the save chance.
    pub from: i32,
    /// Save numerators indexed by [`WeaponClass::index`].
    pub saves: [i32; WeaponClass::COUNT],
}

// =============================================================================
// Mounts
// =============================================================================

/// A mount table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountType {
    /// Abbreviation of the mount item.
    pub item: String,
    /// Riding skill that sets the bonus.
    #[serde(default)]
    pub skill: Option<String>,
    /// Minimum skill to gain any benefit.
    #[serde(default)]
    pub min_bonus: i32,
    /// Maximum bonus.
    #[serde(default)]
    pub max_bonus: i32,
    /// Maximum bonus for a flying mount in terrain that only allows riding.
    #[serde(default)]
    pub max_hampered_bonus: i32,
    /// Special ability of the mount itself, e.g. a trample.
    #[serde(default)]
    pub special: Option<String>,
    /// Level of the mount special.
    #[serde(default)]
    pub special_level: i32,
}

// =============================================================================
// Monsters
// =============================================================================

/// Item category a monster's loot is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoilCategory {
    /// Normal goods; half the time trade goods instead.
    Normal,
    /// Advanced goods.
    Advanced,
    /// Trade goods.
    Trade,
    /// Magic items.
    Magic,
}

/// A monster table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterType {
    /// Abbreviation of the monster item.
    pub item: String,
    /// Display name.
    pub name: String,
    /// Attack skill.
    #[serde(default)]
    pub attack_level: i32,
    /// Innate defense indexed by [`AttackType::index`].
    #[serde(default)]
    pub defense: [i32; AttackType::COUNT],
    /// Hits; values below one are raised to one.
    #[serde(default)]
    pub hits: i32,
    /// Attacks per round; zero is raised to one.
    #[serde(default)]
    pub attacks: i32,
    /// Innate special ability.
    #[serde(default)]
    pub special: Option<String>,
    /// Level of the innate special.
    #[serde(default)]
    pub special_level: i32,
    /// Silver carried, the base of all loot rolls.
    #[serde(default)]
    pub silver: i32,
    /// Loot category, if any.
    #[serde(default)]
    pub spoil: Option<SpoilCategory>,
    /// Hits regenerated each round when battle regeneration is enabled.
    #[serde(default)]
    pub regen: i32,
}

// =============================================================================
// Battle items
// =============================================================================

bitflags! {
    /// Battle item behaviour bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BattleItemFlags: u32 {
        /// Grants its special ability to the bearer.
        const SPECIAL = 1 << 0;
        /// Raises the bearer's defense against the special's shield types.
        const SHIELD = 1 << 1;
        /// Usable only by mages and apprentices.
        const MAGEONLY = 1 << 2;
    }
}

/// A battle item table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleItemType {
    /// Abbreviation of the battle item.
    pub item: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: BattleItemFlags,
    /// Special ability granted or whose shield list is used.
    #[serde(default)]
    pub special: Option<String>,
    /// Level of the granted special or shield.
    #[serde(default)]
    pub skill_level: i32,
}
