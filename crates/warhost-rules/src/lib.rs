//! # Warhost Rules
//!
//! Read-only rule tables for the Warhost battle engine.
//!
//! A ruleset is plain data: the item catalog, the weapon, armor, mount,
//! monster and battle item tables, skills, special abilities, effects,
//! buildings and terrain, plus the global battle switches. It is loaded
//! once from JSON and validated up front, so every cross-table reference
//! the engine follows is known to resolve.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warhost_rules::Ruleset;
//!
//! let rules = Ruleset::from_json_str(&std::fs::read_to_string("rules.json")?)?;
//! if let Some(sword) = rules.find_item("SWOR") {
//!     let weapon = rules.weapon(sword);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod combat;
pub mod config;
pub mod error;
pub mod ids;
pub mod items;
pub mod magic;
pub mod places;
pub mod ruleset;

// Re-exports for convenience
pub use combat::{
    ArmorFlags, ArmorType, AttackCount, AttackType, BattleItemFlags, BattleItemType,
    MonsterType, MountType, SpoilCategory, WeaponClass, WeaponFlags, WeaponType,
};
pub use config::{BattleConfig, Designated, HealTier, PrepareMode, RoutMode};
pub use error::RulesError;
pub use ids::{EffectId, ItemId, ObjectTypeId, SkillId, SpecialId, TerrainId};
pub use items::{ItemKind, ItemType};
pub use magic::{
    DamageEntry, DefenseMod, EffectFlags, EffectType, ShieldCoverage, SkillFlags, SkillType,
    SpecialFlags, SpecialType, TargetFlags,
};
pub use places::{ObjectType, TerrainFlags, TerrainType};
pub use ruleset::{DesignatedIds, Ruleset, RulesetDef, HEAL_TIERS, MAX_BATTLE_ITEMS};
