//! Monte-Carlo estimates of how an engagement is likely to go.
//!
//! Each trial fights the engagement on its own copy of the world with its
//! own seed, so trials run in parallel and the tally does not depend on
//! thread scheduling.
//!
//! # Example
//!
//! ```no_run
//! use warhost_core::odds::estimate_odds;
//! # fn demo(rules: &warhost_rules::Ruleset, world: &warhost_core::world::World,
//! #         region: &warhost_core::world::Region, engagement: &warhost_core::Engagement) {
//! let odds = estimate_odds(rules, world, region, engagement, 1_000, 42);
//! println!("attacker wins {:.0}% of the time", odds.win_rate() * 100.0);
//! # }
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warhost_rules::Ruleset;

use crate::battle::BattleResult;
use crate::engagement::{resolve_engagement, Engagement};
use crate::rng::SeededRng;
use crate::world::{Region, World};

/// Tally of trial outcomes, from the attacker's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    /// Trials fought.
    pub trials: u32,
    /// Trials the attacker won.
    pub won: u32,
    /// Trials the attacker lost.
    pub lost: u32,
    /// Trials that ended in a draw.
    pub drawn: u32,
    /// Trials refused before any fighting.
    pub impossible: u32,
}

impl Odds {
    fn record(mut self, result: BattleResult) -> Self {
        self.trials += 1;
        match result {
            BattleResult::Won => self.won += 1,
            BattleResult::Lost => self.lost += 1,
            BattleResult::Draw => self.drawn += 1,
            BattleResult::Impossible => self.impossible += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            trials: self.trials + other.trials,
            won: self.won + other.won,
            lost: self.lost + other.lost,
            drawn: self.drawn + other.drawn,
            impossible: self.impossible + other.impossible,
        }
    }

    /// Share of trials the attacker won; 0 when nothing was fought.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            f64::from(self.won) / f64::from(self.trials)
        }
    }
}

/// Fights `engagement` `trials` times, trial `i` seeded with
/// `base_seed + i`.
///
/// `world` is left untouched; every trial works on a clone.
#[must_use]
pub fn estimate_odds(
    rules: &Ruleset,
    world: &World,
    region: &Region,
    engagement: &Engagement,
    trials: u32,
    base_seed: u64,
) -> Odds {
    let odds = (0..trials)
        .into_par_iter()
        .map(|i| {
            let mut world = world.clone();
            let mut rng = SeededRng::new(base_seed.wrapping_add(u64::from(i)));
            resolve_engagement(rules, &mut world, &mut rng, region, engagement).result
        })
        .fold(Odds::default, Odds::record)
        .reduce(Odds::default, Odds::merge);
    debug!(trials, won = odds.won, lost = odds.lost, "odds estimated");
    odds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{add_unit, duel, region, rules, two_factions};

    #[test]
    fn identical_seeds_give_identical_tallies() {
        let rules = rules();
        let mut world = two_factions();
        let a = add_unit(&mut world, &rules, 10, "Red", 1, &[("MAN", 5), ("SWOR", 5)]);
        let b = add_unit(&mut world, &rules, 20, "Blue", 2, &[("MAN", 5)]);
        let engagement = duel(a, b);
        let region = region(&rules);

        let first = estimate_odds(&rules, &world, &region, &engagement, 64, 7);
        let second = estimate_odds(&rules, &world, &region, &engagement, 64, 7);

        assert_eq!(first, second);
        assert_eq!(first.trials, 64);
        assert_eq!(first.won + first.lost + first.drawn, 64);
        assert_eq!(world.unit(b).unwrap().items.get(rules.find_item("MAN").unwrap()), 5);
    }

    #[test]
    fn refused_engagements_are_counted() {
        let rules = rules();
        let mut world = two_factions();
        let a = add_unit(&mut world, &rules, 10, "Red", 1, &[("MAN", 1)]);
        let b = add_unit(&mut world, &rules, 11, "Red too", 1, &[("MAN", 1)]);

        let odds = estimate_odds(&rules, &world, &region(&rules), &duel(a, b), 10, 0);

        assert_eq!(odds.impossible, 10);
        assert!(odds.win_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn no_trials_no_rate() {
        assert!(Odds::default().win_rate().abs() < f64::EPSILON);
    }
}
