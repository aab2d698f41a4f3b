//! Post-battle healing of the winning side.

use warhost_rules::{Ruleset, HEAL_TIERS};

use super::Army;
use crate::battle::BattleLog;
use crate::rng::RandomSource;
use crate::world::World;

impl Army {
    /// True while some dead soldier may still be treated.
    fn can_be_healed(&self) -> bool {
        self.dead().any(|s| s.can_be_healed)
    }

    /// Heals casualties: magical healers from the highest tier down, then
    /// herbs and potions.
    pub fn do_heal(
        &mut self,
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        log: &mut BattleLog,
    ) {
        for tier in (1..=HEAL_TIERS).rev() {
            self.do_heal_level(rules, world, rng, log, tier, false);
        }
        self.do_heal_level(rules, world, rng, log, 1, true);
    }

    /// One pass of healers of a single tier.
    ///
    /// Each healer treats random casualties until its treatments run out.
    /// A failed treatment leaves the patient beyond help.
    fn do_heal_level(
        &mut self,
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        log: &mut BattleLog,
        tier: usize,
        use_items: bool,
    ) {
        let rate = rules.heal_tier(tier).rate;
        let des = rules.designated();

        let mut i = 0;
        while i < self.num_alive() {
            if !self.can_be_healed() {
                break;
            }
            let healer = &self.soldiers[i];
            i += 1;
            if healer.heal_level != tier || healer.healing <= 0 {
                continue;
            }
            if healer.heal_item.is_some() != use_items {
                continue;
            }
            let practiced = if use_items {
                (healer.heal_item != des.healing_potion)
                    .then_some(des.healing_skill)
                    .flatten()
            } else {
                des.magical_healing_skill
            };
            if let Some(skill) = practiced {
                if let Some(unit) = world.unit_mut(healer.unit) {
                    unit.practice(skill);
                }
            }

            let h = i - 1;
            let mut healed = 0;
            while self.soldiers[h].healing > 0 && self.can_be_healed() {
                let dead = i32::try_from(self.count() - self.num_alive()).unwrap_or(i32::MAX);
                let j = usize::try_from(rng.roll(dead)).unwrap_or(0) + self.num_alive();
                if !self.soldiers[j].can_be_healed {
                    continue;
                }
                self.soldiers[h].healing -= 1;
                if rng.roll(100) < rate {
                    healed += 1;
                    self.revive(j);
                } else {
                    self.soldiers[j].can_be_healed = false;
                }
            }
            log.add(format!("{} heals {}.", self.soldiers[h].name, healed));
        }
    }

    /// Moves a dead soldier back to the living.
    fn revive(&mut self, index: usize) {
        self.soldiers.swap(index, self.not_behind);
        self.not_behind += 1;
    }
}
