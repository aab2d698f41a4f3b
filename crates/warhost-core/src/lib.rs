//! # Warhost Core
//!
//! Deterministic battle resolution for the Warhost play-by-mail game.
//!
//! The turn orchestrator hands the engine an [`Engagement`] (who attacks
//! whom, and with which rosters) together with the ruleset, the world and
//! the turn's random source. The engine fights the battle, writes the
//! results back onto the units and returns a [`BattleOutcome`] with the
//! narrative and everything the orchestrator must account for.
//!
//! ## Architecture
//!
//! - **Soldiers**: one per man or monster, derived from unit inventories
//! - **Armies**: soldier rosters partitioned in place by rank and readiness
//! - **Battle**: free round, normal rounds, rout and settlement
//! - **Engagement**: validation and the orchestrator-facing summary
//!
//! ## Determinism
//!
//! Every random decision is one draw from a [`RandomSource`], taken in a
//! fixed order. The same seed and the same inputs produce the same report
//! byte for byte.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warhost_core::{resolve_engagement, Engagement, SeededRng};
//!
//! let mut rng = SeededRng::new(turn_seed);
//! let outcome = resolve_engagement(&rules, &mut world, &mut rng, &region, &engagement);
//! for line in outcome.battle.map(|b| b.report_for(faction)).unwrap_or_default() {
//!     println!("{line}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod army;
pub mod battle;
pub mod engagement;
pub mod odds;
pub mod rng;
pub mod shields;
pub mod soldier;
pub mod world;

// Re-exports for convenience
pub use army::{Army, Attack, Settlement, Strike};
pub use battle::{Assassination, Battle, BattleLog, BattleResult};
pub use engagement::{resolve_engagement, validate, BattleOutcome, Engagement, EngagementError};
pub use odds::{estimate_odds, Odds};
pub use rng::{hits, RandomSource, SeededRng};
pub use shields::{Shield, ShieldList};
pub use soldier::Soldier;
pub use world::{
    Faction, FactionId, GuardStatus, ItemList, Location, Object, ObjectId, Region, SpoilsMode,
    Unit, UnitFlags, UnitId, UnitKind, World,
};

#[cfg(test)]
mod tests;
