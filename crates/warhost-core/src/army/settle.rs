//! Writing a finished battle back onto the units.
//!
//! Every soldier hands its equipment back to its unit. Survivors have their
//! movement and guard state adjusted, the dead are removed from their unit,
//! losers drop part of their inventory and winners share the spoils.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warhost_rules::{ItemId, ItemKind, Ruleset, SpoilCategory};

use super::Army;
use crate::battle::BattleLog;
use crate::rng::RandomSource;
use crate::soldier::Soldier;
use crate::world::{GuardStatus, ItemList, Unit, UnitId, UnitKind, World};

/// Items a battle moved out of the losers' hands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Items to share among the winners.
    pub spoils: ItemList,
    /// Items destroyed in the fighting or left unclaimed.
    pub dropped: ItemList,
}

/// How a surviving soldier's side fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    Loss,
    Win,
    WinDead,
}

/// Returns a soldier's equipment and unspent healing supplies to its unit.
fn restore_items(rules: &Ruleset, unit: &mut Unit, s: &Soldier) {
    for item in [s.weapon, s.armor, s.riding].into_iter().flatten() {
        unit.items.add(item, 1);
    }
    for (item, _) in rules.battle_items() {
        if rules
            .battle_item_slot(item)
            .is_some_and(|slot| s.has_battle_item(slot))
        {
            unit.items.add(item, 1);
        }
    }
    let Some(heal_item) = s.heal_item else {
        return;
    };
    let left = u32::try_from(s.healing).unwrap_or(0);
    if Some(heal_item) == rules.designated().healing_potion {
        let charges = u32::try_from(rules.config().healing_potion_charges).unwrap_or(0);
        if charges > 0 {
            unit.items.add(heal_item, left / charges);
        }
    } else {
        unit.items.add(heal_item, left);
    }
}

fn alive(rules: &Ruleset, unit: &mut Unit, s: &Soldier, standing: Standing) {
    restore_items(rules, unit, s);
    if standing == Standing::Loss {
        unit.can_attack = false;
        if !s.amulet && matches!(unit.guard, GuardStatus::Guard | GuardStatus::Set) {
            unit.guard = GuardStatus::None;
        }
    } else {
        unit.advancing = false;
    }
    if standing == Standing::WinDead {
        unit.can_attack = false;
        unit.no_move = true;
    }
}

fn dead(rules: &Ruleset, unit: &mut Unit, s: &Soldier) {
    restore_items(rules, unit, s);
    unit.items.take(s.race, 1);
    unit.losses += 1;
}

impl Army {
    /// Applies [`alive`] or [`dead`] to every soldier.
    fn settle_soldiers(&self, rules: &Ruleset, world: &mut World, standing: Standing) {
        for (i, s) in self.soldiers.iter().enumerate() {
            let Some(unit) = world.unit_mut(s.unit) else {
                debug!(unit = %s.unit, "settling soldier of missing unit");
                continue;
            };
            if i < self.num_alive() {
                alive(rules, unit, s, standing);
            } else {
                dead(rules, unit, s);
            }
        }
    }

    /// Logs the army's casualties and the units that took them.
    pub fn write_losses(&self, log: &mut BattleLog) {
        log.add(format!("{} loses {}.", self.leader, self.count() - self.num_alive()));
        if self.num_alive() == self.count() {
            return;
        }
        let mut seen = BTreeSet::new();
        let damaged: Vec<String> = self
            .dead()
            .filter(|s| seen.insert(s.unit))
            .map(|s| s.unit.to_string())
            .collect();
        log.add(format!("Damaged units: {}.", damaged.join(", ")));
    }

    /// Settles the losing side. Dead wandering monsters add their loot to
    /// `settlement.spoils`.
    pub fn lose(
        &mut self,
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        log: &mut BattleLog,
        settlement: &mut Settlement,
    ) {
        self.write_losses(log);
        for s in self.dead() {
            let Some(unit) = world.unit(s.unit) else {
                continue;
            };
            if unit.kind == UnitKind::WanderingMonster
                && rules.item(s.race).kind.contains(ItemKind::MONSTER)
            {
                monster_spoils(rules, rng, s.race, unit.free, &mut settlement.spoils);
            }
        }
        self.settle_soldiers(rules, world, Standing::Loss);
    }

    /// Settles a drawn battle.
    pub fn tie(&mut self, rules: &Ruleset, world: &mut World, log: &mut BattleLog) {
        self.write_losses(log);
        self.settle_soldiers(rules, world, Standing::WinDead);
    }

    /// Settles the winning side: heals, writes losses, then shares
    /// `settlement.spoils` among the surviving units. Whatever nobody can
    /// carry moves to `settlement.dropped`.
    pub fn win(
        &mut self,
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        log: &mut BattleLog,
        settlement: &mut Settlement,
    ) {
        self.do_heal(rules, world, rng, log);
        self.write_losses(log);
        let standing = if self.num_alive() < self.count() {
            Standing::WinDead
        } else {
            Standing::Win
        };
        self.settle_soldiers(rules, world, standing);

        let units = self.surviving_units();
        let loot: Vec<(ItemId, u32)> = settlement.spoils.iter().collect();
        for (item, n) in loot {
            let unclaimed = distribute(rules, world, rng, &units, item, n);
            settlement.dropped.add(item, unclaimed);
        }
    }

    /// Takes the losers' share of their inventories: each unit loses
    /// `items * dead / (alive + dead)` of every stack, half of it (rounded
    /// at random) to the spoils and the rest destroyed.
    ///
    /// Unfinished ships are lost whole with the same probability. When
    /// `ring_assassination` is set the victim keeps its amulet of true
    /// seeing.
    pub fn get_spoils(
        &self,
        rules: &Ruleset,
        world: &mut World,
        rng: &mut dyn RandomSource,
        settlement: &mut Settlement,
        ring_assassination: bool,
    ) {
        let true_seeing = rules.designated().true_seeing;
        let mut seen = BTreeSet::new();
        for loc in &self.locations {
            if !seen.insert(loc.unit) {
                continue;
            }
            let Some(unit) = world.unit_mut(loc.unit) else {
                continue;
            };
            let alive = u64::from(unit.soldier_count(rules));
            let dead = u64::from(unit.losses);
            if alive + dead == 0 {
                continue;
            }
            let stacks: Vec<(ItemId, u32)> = unit.items.iter().collect();
            for (item, n) in stacks {
                let kind = rules.item(item).kind;
                if kind.is_soldier() || (ring_assassination && Some(item) == true_seeing) {
                    continue;
                }
                if kind.contains(ItemKind::SHIP) {
                    let chance = i32::try_from(100 * dead / (alive + dead)).unwrap_or(100);
                    if rng.roll(100) < chance {
                        unit.items.take(item, n);
                        settlement.spoils.add(item, n);
                    }
                    continue;
                }
                let lost = u32::try_from(u64::from(n) * dead / (alive + dead)).unwrap_or(n);
                let half = u32::try_from((i64::from(lost) + i64::from(rng.roll(2))) / 2).unwrap_or(0);
                let to_spoils = if kind.contains(ItemKind::ALWAYS_SPOIL) {
                    lost
                } else if kind.contains(ItemKind::NEVER_SPOIL) {
                    0
                } else {
                    half
                };
                unit.items.take(item, lost);
                settlement.spoils.add(item, to_spoils);
                settlement.dropped.add(item, lost - to_spoils);
            }
        }
    }
}

/// Shares `n` of `item` among `units`. Returns how many nobody could take.
///
/// Ships go whole to one random taker. Other items are split in proportion
/// to how many each unit will carry, the odd remainder handed out one at a
/// time.
fn distribute(
    rules: &Ruleset,
    world: &mut World,
    rng: &mut dyn RandomSource,
    units: &[UnitId],
    item: ItemId,
    n: u32,
) -> u32 {
    let takers: Vec<(UnitId, u64)> = units
        .iter()
        .filter_map(|&id| {
            let unit = world.unit(id)?;
            unit.can_get_spoil(rules, item)
                .then(|| (id, u64::from(unit.spoil_allowance(rules, item).unwrap_or(n).min(n))))
        })
        .collect();
    if takers.is_empty() || n == 0 {
        return n;
    }

    if rules.item(item).kind.contains(ItemKind::SHIP) {
        let count = i32::try_from(takers.len()).unwrap_or(i32::MAX);
        let pick = usize::try_from(rng.roll(count)).unwrap_or(0);
        if let Some(unit) = world.unit_mut(takers[pick].0) {
            unit.items.add(item, n);
        }
        return 0;
    }

    let weight: u64 = takers.iter().map(|&(_, w)| w).sum();
    let total = weight.min(u64::from(n));
    let mut shares: Vec<u64> = takers.iter().map(|&(_, w)| total * w / weight).collect();
    let mut remainder = total - shares.iter().sum::<u64>();
    while remainder > 0 {
        let open: Vec<usize> = (0..takers.len()).filter(|&i| shares[i] < takers[i].1).collect();
        let count = i32::try_from(open.len()).unwrap_or(i32::MAX);
        let pick = usize::try_from(rng.roll(count)).unwrap_or(0);
        let Some(&i) = open.get(pick) else {
            break;
        };
        shares[i] += 1;
        remainder -= 1;
    }

    for (&(id, _), &share) in takers.iter().zip(&shares) {
        if let Some(unit) = world.unit_mut(id) {
            unit.items.add(item, u32::try_from(share).unwrap_or(0));
        }
    }
    let given: u64 = shares.iter().sum();
    u32::try_from(u64::from(n) - given).unwrap_or(0)
}

/// Loot dropped by one dead wandering monster.
///
/// Monsters that have roamed free for a while drop less, and nothing once
/// they have been free for the full recovery period.
fn monster_spoils(
    rules: &Ruleset,
    rng: &mut dyn RandomSource,
    race: ItemId,
    free: i32,
    spoils: &mut ItemList,
) {
    let Some(monster) = rules.monster(race) else {
        return;
    };
    let cfg = rules.config();
    let recovery = cfg.monster_spoils_recovery;
    if cfg.monster_no_spoils > 0 && free >= recovery {
        return;
    }
    let decays = cfg.monster_no_spoils > 0 && free > 0 && recovery > 0;
    let scale = |v: i32| if decays { v * (recovery - free) / recovery } else { v };
    let silver = scale(monster.silver);

    if let Some(category) = monster.spoil {
        let kind = match category {
            SpoilCategory::Normal => {
                if rng.roll(2) != 0 && !cfg.spoils_no_trade {
                    ItemKind::TRADE
                } else {
                    ItemKind::NORMAL
                }
            }
            SpoilCategory::Advanced => ItemKind::ADVANCED,
            SpoilCategory::Trade => ItemKind::TRADE,
            SpoilCategory::Magic => ItemKind::MAGIC,
        };
        let eligible: Vec<ItemId> = rules
            .item_ids()
            .filter(|&id| {
                let it = rules.item(id);
                it.kind.contains(kind) && !it.kind.contains(ItemKind::SPECIAL) && !it.disabled
            })
            .collect();
        let count = i32::try_from(eligible.len()).unwrap_or(i32::MAX);
        if count > 0 {
            let pick = eligible[usize::try_from(rng.roll(count)).unwrap_or(0)];
            let price = i32::try_from(rules.item(pick).base_price).unwrap_or(i32::MAX);
            if price > 0 {
                let value = scale(rng.roll(monster.silver * 2));
                let amount = (value + rng.roll(price)) / price;
                spoils.add(pick, u32::try_from(amount).unwrap_or(0));
            }
        }
    }

    if let Some(coin) = rules.designated().silver {
        spoils.add(coin, u32::try_from(rng.roll(silver)).unwrap_or(0));
    }
}
