//! Healing, spell, battle item and equipment setup for men.

use tracing::debug;
use warhost_rules::{
    ArmorFlags, AttackType, BattleItemFlags, ItemId, PrepareMode, Ruleset,
    SkillFlags, TerrainType, WeaponFlags, WeaponType, HEAL_TIERS,
};

use super::Soldier;
use crate::world::Unit;

/// Bonuses a usable weapon grants its wielder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeaponUse {
    attack: i32,
    defense: i32,
    attacks: i32,
}

/// Level of the better of a weapon's two skills, or `None` if the wielder
/// cannot use it at all.
fn weapon_skill(rules: &Ruleset, unit: &Unit, weapon: &WeaponType, mounted: bool) -> Option<i32> {
    if mounted && weapon.flags.contains(WeaponFlags::NOMOUNT) {
        return None;
    }
    if !mounted && weapon.flags.contains(WeaponFlags::NOFOOT) {
        return None;
    }
    let base = unit.skill(weapon.base_skill.as_deref().and_then(|s| rules.find_skill(s)));
    let alt = unit.skill(weapon.or_skill.as_deref().and_then(|s| rules.find_skill(s)));
    let level = base.max(alt);
    if weapon.flags.contains(WeaponFlags::NEEDSKILL) && level == 0 {
        return None;
    }
    Some(level)
}

/// Attack and defense bonuses of a weapon for a wielder with `level` skill
/// and `riding_bonus` from a mount.
fn weapon_use(weapon: &WeaponType, level: i32, riding_bonus: i32) -> WeaponUse {
    let mut attack = level + weapon.attack_bonus;
    let mut defense = if weapon.flags.contains(WeaponFlags::NOATTACKERSKILL) {
        weapon.defense_bonus
    } else {
        level + weapon.defense_bonus
    };
    if weapon.flags.contains(WeaponFlags::RIDINGBONUS) {
        attack += riding_bonus;
        defense += riding_bonus;
    } else if weapon.flags.contains(WeaponFlags::RIDINGBONUSDEFENSE) {
        defense += riding_bonus;
    }
    WeaponUse {
        attack,
        defense,
        attacks: weapon.attacks.resolve(level),
    }
}

/// First item of `ready` that passes `usable`, else the first in catalog
/// order.
fn pick<T>(
    rules: &Ruleset,
    ready: &[ItemId],
    mut usable: impl FnMut(ItemId) -> Option<T>,
) -> Option<(ItemId, T)> {
    ready
        .iter()
        .copied()
        .find_map(|id| usable(id).map(|v| (id, v)))
        .or_else(|| rules.item_ids().find_map(|id| usable(id).map(|v| (id, v))))
}

impl Soldier {
    /// Sets up healing capacity: magical healing for mages, otherwise one
    /// healing potion, otherwise herbs for the healing skill.
    pub(super) fn setup_healing(&mut self, rules: &Ruleset, unit: &mut Unit) {
        let des = rules.designated();

        if unit.is_mage() {
            let tier = usize::try_from(unit.skill(des.magical_healing_skill))
                .unwrap_or(0)
                .min(HEAL_TIERS);
            if tier > 0 {
                self.heal_level = tier;
                self.healing = rules.heal_tier(tier).count;
                self.heal_item = None;
                return;
            }
        }

        if let Some(potion) = des.healing_potion {
            if unit.items.take(potion, 1) == 1 {
                self.heal_level = 1;
                self.healing = rules.config().healing_potion_charges;
                self.heal_item = Some(potion);
                return;
            }
        }

        let treatments = unit.skill(des.healing_skill) * rules.config().heals_per_man;
        if treatments > 0 {
            self.heal_level = 1;
            let herbs = des.herbs;
            let carried = herbs.map_or(0, |h| unit.items.get(h));
            let used = u32::try_from(treatments).unwrap_or(0).min(carried);
            if let Some(h) = herbs {
                unit.items.take(h, used);
            }
            self.healing = i32::try_from(used).unwrap_or(0);
            self.heal_item = herbs;
        }
    }

    /// Adopts the unit's combat spell as the special ability.
    ///
    /// A selection that is not a combat skill is cleared.
    pub(super) fn setup_spell(&mut self, rules: &Ruleset, unit: &mut Unit) {
        if !unit.is_mage() {
            return;
        }
        let Some(spell) = unit.combat_spell else {
            return;
        };
        let skill = rules.skill(spell);
        if !skill.flags.contains(SkillFlags::COMBAT) {
            debug!(unit = %unit.id, spell = %skill.abbr, "combat spell is not a combat skill");
            unit.combat_spell = None;
            return;
        }
        let level = unit.skill(Some(spell));
        if level == 0 {
            return;
        }
        if let Some(special) = skill.special.as_deref().and_then(|k| rules.find_special(k)) {
            self.special = Some(special);
            self.special_level = level;
            unit.practice(spell);
        }
    }

    /// Takes battle items out of the unit's inventory.
    ///
    /// Items the prepare rule forbids, a second special-granting item, an
    /// item whose special would override a spell, and mage-only items in
    /// other hands all stay in the inventory.
    pub(super) fn setup_combat_items(&mut self, rules: &Ruleset, unit: &mut Unit) {
        let prepare = rules.config().prepare;
        let amulet = rules.designated().amulet;
        let mut exclusive = false;

        for (item, battle) in rules.battle_items() {
            if unit.items.get(item) == 0 {
                continue;
            }
            let shield = battle.flags.contains(BattleItemFlags::SHIELD);
            let prepared = unit.ready_item == Some(item);
            let allowed = match prepare {
                PrepareMode::None => true,
                PrepareMode::Normal => unit.ready_item.is_none() || prepared || shield,
                PrepareMode::Strict => prepared || shield,
            };
            if !allowed {
                continue;
            }
            let grants_special = battle.flags.contains(BattleItemFlags::SPECIAL);
            if grants_special && (exclusive || self.special.is_some()) {
                continue;
            }
            if battle.flags.contains(BattleItemFlags::MAGEONLY) && !unit.can_use_mage_items() {
                continue;
            }
            let Some(slot) = rules.battle_item_slot(item) else {
                continue;
            };

            unit.items.take(item, 1);
            self.battle_items |= 1u64 << slot;
            if Some(item) == amulet {
                self.amulet = true;
            }

            let special = battle.special.as_deref().and_then(|k| rules.find_special(k));
            if grants_special {
                exclusive = true;
                self.special = special;
                self.special_level = battle.skill_level;
            }
            if shield {
                if let Some(sp) = special {
                    for coverage in &rules.special(sp).shields {
                        for t in AttackType::ALL {
                            if coverage.covers(t) {
                                let d = &mut self.defense[t.index()];
                                *d = (*d).max(battle.skill_level);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Chooses armor, mount and weapon and derives the final attack and
    /// defense numbers.
    pub(super) fn setup_equipment(
        &mut self,
        rules: &Ruleset,
        unit: &mut Unit,
        terrain: &TerrainType,
        assassination: bool,
    ) {
        // Armor
        let armor = pick(rules, &unit.ready_armor, |id| {
            let a = rules.armor(id)?;
            let ok = unit.items.get(id) > 0
                && !rules.item(id).disabled
                && (!assassination || a.flags.contains(ArmorFlags::USEINASSASSINATE));
            ok.then_some(())
        });
        if let Some((id, ())) = armor {
            unit.items.take(id, 1);
            self.armor = Some(id);
        }

        // Mount
        let mount = pick(rules, &unit.ready_mounts, |id| {
            if unit.items.get(id) == 0 {
                return None;
            }
            mount_bonus(rules, unit, terrain, id)
        });
        if let Some((id, bonus)) = mount {
            unit.items.take(id, 1);
            if let Some(skill) = rules
                .mount(id)
                .and_then(|m| m.skill.as_deref())
                .and_then(|s| rules.find_skill(s))
            {
                unit.practice(skill);
            }
            self.riding = Some(id);
            self.riding_bonus = bonus;
            self.defense[AttackType::Riding.index()] += bonus;
        }

        // Weapon
        let mounted = self.riding.is_some();
        let riding_bonus = self.riding_bonus;
        let weapon = pick(rules, &unit.ready_weapons, |id| {
            let w = rules.weapon(id)?;
            if unit.items.get(id) == 0 || rules.item(id).disabled {
                return None;
            }
            weapon_skill(rules, unit, w, mounted).map(|level| weapon_use(w, level, riding_bonus))
        });

        let bonus = if let Some((id, bonus)) = weapon {
            unit.items.take(id, 1);
            self.weapon = Some(id);
            if let Some(w) = rules.weapon(id) {
                self.attack_type = w.attack_type;
                for skill in [&w.base_skill, &w.or_skill] {
                    if let Some(s) = skill.as_deref().and_then(|s| rules.find_skill(s)) {
                        if unit.skill(Some(s)) > 0 {
                            unit.practice(s);
                        }
                    }
                }
            }
            if self.special.is_none() {
                let battle = rules
                    .battle_item(id)
                    .filter(|b| b.flags.contains(BattleItemFlags::SPECIAL));
                if let Some(battle) = battle {
                    self.special = battle.special.as_deref().and_then(|k| rules.find_special(k));
                    self.special_level = battle.skill_level;
                }
            }
            bonus
        } else {
            let combat = rules.designated().combat_skill;
            if let Some(skill) = combat {
                unit.practice(skill);
            }
            let level = unit.skill(combat) + self.riding_bonus;
            WeaponUse {
                attack: level,
                defense: level,
                attacks: 1,
            }
        };

        self.attack_skill += bonus.attack;
        self.defense[AttackType::Combat.index()] += bonus.defense;
        self.attacks = bonus.attacks;
    }
}

/// Riding bonus a mount gives in this terrain, or `None` if it cannot be
/// used here.
///
/// Flying mounts in terrain that only allows riding are capped at their
/// hampered bonus.
fn mount_bonus(
    rules: &Ruleset,
    unit: &Unit,
    terrain: &TerrainType,
    id: ItemId,
) -> Option<i32> {
    let mount = rules.mount(id)?;
    let item = rules.item(id);
    if item.disabled {
        return None;
    }
    let can_fly = terrain.allows_flying();
    let can_ride = terrain.allows_riding();
    if !can_fly && !can_ride {
        return None;
    }
    if can_fly {
        if item.fly == 0 && !can_ride {
            return None;
        }
    } else if item.ride == 0 {
        return None;
    }

    let Some(skill) = mount.skill.as_deref().and_then(|s| rules.find_skill(s)) else {
        return Some(0);
    };
    let level = unit.skill(Some(skill));
    if level < mount.min_bonus {
        return None;
    }
    let cap = if !can_fly && item.fly > 0 {
        mount.max_hampered_bonus
    } else {
        mount.max_bonus
    };
    Some(level.min(cap))
}
