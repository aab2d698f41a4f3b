//! A battle from first blow to spoils.
//!
//! [`Battle::run`] raises both armies, hands out a free round, fights
//! normal rounds until one side breaks, then settles the result back onto
//! the units:
//!
//! 1. **Header**: who attacks whom, and both rosters
//! 2. **Free round**: the assassin, or the side with better tactics
//! 3. **Rounds**: until an army breaks or the round cap is hit
//! 4. **Ending**: rout and pursuit, casualties, spoils
//!
//! Everything that happens is written to a [`BattleLog`].

mod fight;
mod log;

pub use log::BattleLog;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use warhost_rules::Ruleset;

use crate::army::{Army, Settlement};
use crate::engagement::Engagement;
use crate::rng::RandomSource;
use crate::world::{FactionId, ItemList, Location, Region, Unit, UnitFlags, UnitId, World};
use fight::Fight;

// =============================================================================
// Results
// =============================================================================

/// How an engagement ended, from the attacker's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleResult {
    /// The defenders lost.
    Won,
    /// The attackers lost.
    Lost,
    /// Neither side broke.
    Draw,
    /// The engagement was refused before any fighting.
    Impossible,
}

/// What became of an assassination attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assassination {
    /// The battle was an ordinary attack.
    #[default]
    NotAttempted,
    /// The target survived.
    Failed,
    /// The target was killed or driven off.
    Succeeded,
}

// =============================================================================
// Battle
// =============================================================================

/// A fought battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    /// Outcome for the attacker.
    pub result: BattleResult,
    /// Outcome of the assassination, if this was one.
    pub assassination: Assassination,
    /// Public notice of a successful assassination.
    pub asstext: Option<String>,
    /// Faction of the attacking unit.
    pub attacker_faction: Option<FactionId>,
    /// Full narrative.
    pub log: BattleLog,
    /// Normal rounds fought.
    pub rounds: u32,
    /// Items taken from the losers.
    pub settlement: Settlement,
    /// Fallen men raised as undead.
    pub raised: u32,
    /// Soldiers the attackers lost.
    pub attacker_losses: usize,
    /// Soldiers the defenders lost.
    pub defender_losses: usize,
}

impl Battle {
    /// Fights out an engagement.
    ///
    /// The engagement is taken as valid: units that cannot be found are
    /// left out of the armies.
    ///
    /// # Arguments
    ///
    /// * `rules` - The ruleset
    /// * `world` - Units, objects and factions; written back on settlement
    /// * `rng` - The random source
    /// * `region` - Where the battle is fought
    /// * `engagement` - Who attacks whom
    #[instrument(skip_all, fields(attacker = %engagement.attacker, target = %engagement.target))]
    pub fn run(
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        region: &Region,
        engagement: &Engagement,
    ) -> Self {
        let assassination = engagement.assassination;
        let attacker_faction = world.unit(engagement.attacker).map(|u| u.faction);
        let ring = rules.designated().ring;
        let ring_assassination = assassination
            && world
                .unit(engagement.attacker)
                .zip(ring)
                .is_some_and(|(u, ring)| u.items.get(ring) > 0);

        let mut log = BattleLog::new();
        write_sides(rules, world, region, engagement, &mut log);

        let terrain = rules.terrain(region.terrain);
        let mut a = Army::new(
            rules,
            world,
            engagement.attacker,
            &engagement.attackers,
            terrain,
            assassination,
        );
        let mut b = Army::new(
            rules,
            world,
            engagement.target,
            &engagement.defenders,
            terrain,
            assassination,
        );

        let mut fight = Fight {
            rules,
            rng,
            log: &mut log,
        };

        if assassination {
            fight.free_round(&mut a, &mut b, true);
        } else if a.tactics > b.tactics {
            debug!(tactics = a.tactics, "attackers get the free round");
            fight.free_round(&mut a, &mut b, false);
        } else if b.tactics > a.tactics {
            debug!(tactics = b.tactics, "defenders get the free round");
            fight.free_round(&mut b, &mut a, false);
        }

        let max_rounds = rules.config().max_rounds;
        let mut rounds = 0;
        while rounds < max_rounds
            && !a.broken(rules)
            && !b.broken(rules)
            && a.num_alive() > 0
            && b.num_alive() > 0
        {
            rounds += 1;
            fight.normal_round(rounds, &mut a, &mut b);
        }

        let attackers_lost = (a.broken(rules) && !b.broken(rules))
            || (a.num_alive() == 0 && b.num_alive() > 0);
        let defenders_lost = (b.broken(rules) && !a.broken(rules))
            || (b.num_alive() == 0 && a.num_alive() > 0);

        let mut outcome = Assassination::NotAttempted;
        let mut asstext = None;
        let (result, settlement) = if attackers_lost {
            if assassination {
                outcome = Assassination::Failed;
            }
            let s = fight.rout(world, &mut a, &mut b, ring_assassination);
            (BattleResult::Lost, s)
        } else if defenders_lost {
            if assassination {
                outcome = Assassination::Succeeded;
                asstext = Some(format!("{} is assassinated in {}!", b.leader, region.name));
            }
            let s = fight.rout(world, &mut b, &mut a, ring_assassination);
            (BattleResult::Won, s)
        } else {
            if assassination {
                outcome = Assassination::Failed;
            }
            fight.tie(world, &mut a, &mut b);
            (BattleResult::Draw, Settlement::default())
        };

        Self {
            result,
            assassination: outcome,
            asstext,
            attacker_faction,
            log,
            rounds,
            settlement,
            raised: a.raised + b.raised,
            attacker_losses: a.count() - a.num_alive(),
            defender_losses: b.count() - b.num_alive(),
        }
    }

    /// The report a faction gets of this battle.
    ///
    /// After a successful assassination everyone but the assassin's faction
    /// only learns of the killing itself.
    #[must_use]
    pub fn report_for(&self, faction: FactionId) -> Vec<String> {
        // Only the assassin's own faction sees how the killing went; the
        // victim's side and everyone else get the notice alone.
        if self.assassination == Assassination::Succeeded && self.attacker_faction != Some(faction)
        {
            if let Some(text) = &self.asstext {
                return vec![text.clone()];
            }
        }
        self.log.lines().to_vec()
    }
}

// =============================================================================
// Header
// =============================================================================

/// Writes who attacks whom and lists both rosters.
fn write_sides(
    rules: &Ruleset,
    world: &World,
    region: &Region,
    engagement: &Engagement,
    log: &mut BattleLog,
) {
    let name = |id: UnitId| {
        world
            .unit(id)
            .map_or_else(|| id.to_string(), Unit::display_name)
    };
    let (att, tar) = (name(engagement.attacker), name(engagement.target));
    if engagement.assassination {
        log.add(format!("{att} attempts to assassinate {tar} in {}!", region.name));
    } else {
        log.add(format!("{att} attacks {tar} in {}!", region.name));
    }
    log.add("");

    for (title, roster) in [
        ("Attackers:", &engagement.attackers),
        ("Defenders:", &engagement.defenders),
    ] {
        log.add(title);
        write_roster(rules, world, roster, log);
        log.add("");
    }
}

fn write_roster(rules: &Ruleset, world: &World, roster: &[Location], log: &mut BattleLog) {
    let mut seen = BTreeSet::new();
    for loc in roster {
        if !seen.insert(loc.unit) {
            continue;
        }
        let Some(unit) = world.unit(loc.unit) else {
            continue;
        };
        let mut troops = ItemList::new();
        for (item, n) in unit.items.iter() {
            if rules.item(item).kind.is_soldier() {
                troops.add(item, n);
            }
        }
        let behind = if unit.flags.contains(UnitFlags::BEHIND) {
            ", behind"
        } else {
            ""
        };
        log.add(format!(
            "{}{behind}, {}.",
            unit.display_name(),
            troops.report(rules)
        ));
    }
}

// =============================================================================
// Endings
// =============================================================================

impl Fight<'_> {
    /// Ends the battle with `loser` beaten: the winner pursues a routed
    /// army, then both sides settle. Returns the loot taken.
    fn rout(
        &mut self,
        world: &mut World,
        loser: &mut Army,
        winner: &mut Army,
        ring_assassination: bool,
    ) -> Settlement {
        if loser.num_alive() > 0 {
            self.log.add(format!("{} is routed!", loser.leader));
            self.free_round(winner, loser, false);
        } else {
            self.log.add(format!("{} is destroyed!", loser.leader));
        }

        self.log.add("Total Casualties:");
        let mut settlement = Settlement::default();
        loser.lose(self.rules, world, self.rng, self.log, &mut settlement);
        loser.get_spoils(self.rules, world, self.rng, &mut settlement, ring_assassination);
        let spoils = if settlement.spoils.is_empty() {
            "Spoils: none.".to_string()
        } else {
            format!("Spoils: {}.", settlement.spoils.report(self.rules))
        };
        winner.win(self.rules, world, self.rng, self.log, &mut settlement);

        self.log.add("");
        self.log.add(spoils);
        self.log.add("");
        settlement
    }

    /// Ends the battle with neither side beaten.
    fn tie(&mut self, world: &mut World, a: &mut Army, b: &mut Army) {
        self.log.add("The battle ends indecisively.");
        self.log.add("");
        self.log.add("Total Casualties:");
        a.tie(self.rules, world, self.log);
        b.tie(self.rules, world, self.log);
        self.log.add("");
        self.log.add("Spoils: none.");
        self.log.add("");
    }
}
