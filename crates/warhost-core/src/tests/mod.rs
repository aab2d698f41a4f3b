//! Engine-level tests.
//!
//! These fight whole battles through [`crate::resolve_engagement`] against
//! the sample ruleset:
//! - **Determinism tests**: the same seed gives the same report
//! - **Scenario tests**: free rounds, routs, assassinations, draws
//! - **Settlement tests**: items are conserved across a battle
//!
//! # Test Structure
//!
//! - `determinism.rs`: Seeded replays
//! - `integration.rs`: Battle scenarios end to end
//! - `settlement.rs`: Item bookkeeping after battle
//! - `helpers.rs`: Rulesets, worlds and a scripted random source

pub mod helpers;
