//! The entry point the turn orchestrator calls for one attack.
//!
//! [`resolve_engagement`] checks that the attack is allowed, fights it and
//! summarizes what the orchestrator has to account for afterwards. A
//! refused attack never fights; the attacking unit gets an error line
//! instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};
use warhost_rules::Ruleset;

use crate::battle::{Battle, BattleResult};
use crate::rng::RandomSource;
use crate::world::{ItemList, Location, Region, UnitId, World};

/// One attack or assassination attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    /// Unit that gave the order.
    pub attacker: UnitId,
    /// Unit it was given against.
    pub target: UnitId,
    /// Roster of the attacking side.
    pub attackers: Vec<Location>,
    /// Roster of the defending side.
    pub defenders: Vec<Location>,
    /// An assassination attempt rather than an attack.
    pub assassination: bool,
}

/// Reasons an engagement is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngagementError {
    /// Safe regions allow assassinations only.
    #[error("No battles allowed in safe regions.")]
    SafeRegion,
    /// The target belongs to the attacker's faction or one of its allies.
    #[error("Can't attack an ally.")]
    Ally,
    /// The attacking roster is empty.
    #[error("No one is able to attack.")]
    NoAttackers,
    /// The defending roster is empty.
    #[error("There is no one to attack.")]
    NoDefenders,
    /// A unit named by the engagement does not exist.
    #[error("Unit {0} does not exist.")]
    UnknownUnit(UnitId),
}

/// What the orchestrator gets back from an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Outcome for the attacker.
    pub result: BattleResult,
    /// The battle, unless it was refused.
    pub battle: Option<Battle>,
    /// Items handed to the winners.
    pub spoils: ItemList,
    /// Items destroyed or left unclaimed on the field.
    pub dropped: ItemList,
    /// Fallen men to be spawned as the ruleset's raised undead.
    pub raised_undead: u32,
    /// Normal rounds fought.
    pub rounds: u32,
}

impl BattleOutcome {
    fn impossible() -> Self {
        Self {
            result: BattleResult::Impossible,
            battle: None,
            spoils: ItemList::new(),
            dropped: ItemList::new(),
            raised_undead: 0,
            rounds: 0,
        }
    }
}

/// Checks that `engagement` may be fought in `region`.
///
/// # Errors
///
/// Returns the first rule the engagement breaks.
pub fn validate(
    world: &World,
    region: &Region,
    engagement: &Engagement,
) -> Result<(), EngagementError> {
    let attacker = world
        .unit(engagement.attacker)
        .ok_or(EngagementError::UnknownUnit(engagement.attacker))?;
    let target = world
        .unit(engagement.target)
        .ok_or(EngagementError::UnknownUnit(engagement.target))?;
    if region.safe && !engagement.assassination {
        return Err(EngagementError::SafeRegion);
    }
    if world.is_friendly(attacker.faction, target.faction) {
        return Err(EngagementError::Ally);
    }
    if engagement.attackers.is_empty() {
        return Err(EngagementError::NoAttackers);
    }
    if engagement.defenders.is_empty() {
        return Err(EngagementError::NoDefenders);
    }
    Ok(())
}

/// Resolves one engagement.
///
/// A refused engagement leaves the world untouched apart from an error
/// line on the attacking unit, and comes back as
/// [`BattleResult::Impossible`].
///
/// # Arguments
///
/// * `rules` - The ruleset
/// * `world` - Units, objects and factions
/// * `rng` - The turn's random source
/// * `region` - Where the engagement takes place
/// * `engagement` - Who attacks whom
#[instrument(skip_all, fields(attacker = %engagement.attacker, target = %engagement.target))]
pub fn resolve_engagement(
    rules: &Ruleset,
    world: &mut World,
    rng: &mut dyn RandomSource,
    region: &Region,
    engagement: &Engagement,
) -> BattleOutcome {
    if let Err(err) = validate(world, region, engagement) {
        debug!(%err, "engagement refused");
        let order = if engagement.assassination {
            "ASSASSINATE"
        } else {
            "ATTACK"
        };
        if let Some(unit) = world.unit_mut(engagement.attacker) {
            unit.errors.push(format!("{order}: {err}"));
        }
        return BattleOutcome::impossible();
    }

    let battle = Battle::run(rules, world, rng, region, engagement);
    info!(
        result = ?battle.result,
        rounds = battle.rounds,
        attacker_losses = battle.attacker_losses,
        defender_losses = battle.defender_losses,
        "battle resolved"
    );
    BattleOutcome {
        result: battle.result,
        spoils: battle.settlement.spoils.clone(),
        dropped: battle.settlement.dropped.clone(),
        raised_undead: battle.raised,
        rounds: battle.rounds,
        battle: Some(battle),
    }
}
