use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use warhost_rules::{ItemId, Ruleset, SkillId};

use super::{FactionId, ItemList, UnitId};

/// What sort of unit this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// An ordinary unit.
    #[default]
    Normal,
    /// A mage; may cast combat spells and heal magically.
    Mage,
    /// A mage guarding a region for the guard faction.
    GuardMage,
    /// An apprentice; may use mage-only items.
    Apprentice,
    /// Wandering monsters; drop loot when killed.
    WanderingMonster,
    /// Guard monsters.
    GuardMonster,
}

bitflags! {
    /// Standing unit flags relevant to battle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct UnitFlags: u32 {
        /// Fights from the behind rank.
        const BEHIND = 1 << 0;
        /// Refuses all spoils.
        const NOSPOILS = 1 << 1;
    }
}

/// Which spoils a unit is willing to pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoilsMode {
    /// Takes everything.
    #[default]
    All,
    /// Takes only weightless spoils.
    None,
    /// Takes what it can still walk with.
    Walk,
    /// Takes what it can still ride with.
    Ride,
    /// Takes what it can still fly with.
    Fly,
}

/// Guard status of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardStatus {
    /// Not guarding.
    #[default]
    None,
    /// Guarding the region.
    Guard,
    /// Avoiding combat.
    Avoid,
    /// Ordered to guard, taking effect this turn.
    Set,
}

/// A persistent game unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Game number.
    pub id: UnitId,
    /// Display name without the number.
    pub name: String,
    /// Owning faction.
    pub faction: FactionId,
    /// Unit type.
    #[serde(default)]
    pub kind: UnitKind,
    /// Inventory, including men and monsters.
    #[serde(default)]
    pub items: ItemList,
    /// Skill levels.
    #[serde(default)]
    pub skills: BTreeMap<SkillId, i32>,
    /// Standing flags.
    #[serde(default)]
    pub flags: UnitFlags,
    /// Spoils pickup mode.
    #[serde(default)]
    pub spoils: SpoilsMode,
    /// Guard status.
    #[serde(default)]
    pub guard: GuardStatus,
    /// Preferred weapons, best first.
    #[serde(default)]
    pub ready_weapons: Vec<ItemId>,
    /// Preferred armor, best first.
    #[serde(default)]
    pub ready_armor: Vec<ItemId>,
    /// Preferred mounts, best first.
    #[serde(default)]
    pub ready_mounts: Vec<ItemId>,
    /// Battle item prepared for use.
    #[serde(default)]
    pub ready_item: Option<ItemId>,
    /// Selected combat spell.
    #[serde(default)]
    pub combat_spell: Option<SkillId>,
    /// May still attack this turn.
    #[serde(default = "yes")]
    pub can_attack: bool,
    /// May no longer move this turn.
    #[serde(default)]
    pub no_move: bool,
    /// Advancing into this region; cleared by any battle it survives.
    #[serde(default)]
    pub advancing: bool,
    /// Soldiers lost in the last battle.
    #[serde(default)]
    pub losses: u32,
    /// Months a monster has roamed free.
    #[serde(default)]
    pub free: i32,
    /// Skills exercised this turn.
    #[serde(default)]
    pub practiced: BTreeSet<SkillId>,
    /// Order errors for the owner's report.
    #[serde(default)]
    pub errors: Vec<String>,
}

fn yes() -> bool {
    true
}

impl Unit {
    /// Creates an empty normal unit.
    #[must_use]
    pub fn new(id: UnitId, name: &str, faction: FactionId) -> Self {
        Self {
            id,
            name: name.to_string(),
            faction,
            kind: UnitKind::Normal,
            items: ItemList::new(),
            skills: BTreeMap::new(),
            flags: UnitFlags::empty(),
            spoils: SpoilsMode::All,
            guard: GuardStatus::None,
            ready_weapons: Vec::new(),
            ready_armor: Vec::new(),
            ready_mounts: Vec::new(),
            ready_item: None,
            combat_spell: None,
            can_attack: true,
            no_move: false,
            advancing: false,
            losses: 0,
            free: 0,
            practiced: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    /// Name with number, e.g. `"Swords (12)"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    /// Level in a skill; an absent skill is level 0.
    #[must_use]
    pub fn skill(&self, skill: Option<SkillId>) -> i32 {
        skill
            .and_then(|s| self.skills.get(&s).copied())
            .unwrap_or(0)
    }

    /// Records that a skill was exercised.
    pub fn practice(&mut self, skill: SkillId) {
        self.practiced.insert(skill);
    }

    /// Mages and guard mages cast combat spells.
    #[must_use]
    pub fn is_mage(&self) -> bool {
        matches!(self.kind, UnitKind::Mage | UnitKind::GuardMage)
    }

    /// Mages, guard mages and apprentices may use mage-only items.
    #[must_use]
    pub fn can_use_mage_items(&self) -> bool {
        self.is_mage() || self.kind == UnitKind::Apprentice
    }

    /// Number of soldiers this unit fields: every man and monster it holds.
    #[must_use]
    pub fn soldier_count(&self, rules: &Ruleset) -> u32 {
        self.items
            .iter()
            .filter(|&(id, _)| rules.item(id).kind.is_soldier())
            .map(|(_, n)| n)
            .sum()
    }

    /// Total weight carried.
    #[must_use]
    pub fn weight(&self, rules: &Ruleset) -> i64 {
        self.items
            .iter()
            .map(|(id, n)| i64::from(rules.item(id).weight) * i64::from(n))
            .sum()
    }

    fn mode_capacity(&self, rules: &Ruleset, item: ItemId) -> i64 {
        let it = rules.item(item);
        i64::from(match self.spoils {
            SpoilsMode::Walk => it.walk,
            SpoilsMode::Ride => it.ride,
            SpoilsMode::Fly => it.fly,
            SpoilsMode::All | SpoilsMode::None => 0,
        })
    }

    /// Carrying capacity under the unit's spoils mode.
    #[must_use]
    pub fn capacity(&self, rules: &Ruleset) -> i64 {
        self.items
            .iter()
            .map(|(id, n)| self.mode_capacity(rules, id) * i64::from(n))
            .sum()
    }

    /// How many of `item` this unit will pick up as spoils.
    ///
    /// `None` means no limit. Weightless items are always welcome; units
    /// flagged NOSPOILS or in mode `none` refuse everything else. Capacity
    /// modes take as many as fit, counting the capacity the item itself
    /// adds.
    #[must_use]
    pub fn spoil_allowance(&self, rules: &Ruleset, item: ItemId) -> Option<u32> {
        let weight = i64::from(rules.item(item).weight);
        if weight == 0 {
            return None;
        }
        if self.flags.contains(UnitFlags::NOSPOILS) {
            return Some(0);
        }
        match self.spoils {
            SpoilsMode::All => None,
            SpoilsMode::None => Some(0),
            SpoilsMode::Walk | SpoilsMode::Ride | SpoilsMode::Fly => {
                let net = weight - self.mode_capacity(rules, item);
                if net <= 0 {
                    return None;
                }
                let spare = (self.capacity(rules) - self.weight(rules)).max(0);
                Some(u32::try_from(spare / net).unwrap_or(u32::MAX))
            }
        }
    }

    /// True if this unit will take at least one of `item`.
    #[must_use]
    pub fn can_get_spoil(&self, rules: &Ruleset, item: ItemId) -> bool {
        self.spoil_allowance(rules, item) != Some(0)
    }
}
