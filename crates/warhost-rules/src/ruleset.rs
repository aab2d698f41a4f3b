//! The immutable rule lookup service.
//!
//! A [`Ruleset`] is loaded once from a [`RulesetDef`] and then shared
//! read-only by everything that resolves battles. Lookups by abbreviation
//! return `Option`; absence means the feature is disabled in this ruleset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{ArmorType, BattleItemType, MonsterType, MountType, WeaponType};
use crate::config::{BattleConfig, Designated, HealTier};
use crate::error::RulesError;
use crate::ids::{EffectId, ItemId, ObjectTypeId, SkillId, SpecialId, TerrainId};
use crate::items::ItemType;
use crate::magic::{EffectType, SkillType, SpecialType};
use crate::places::{ObjectType, TerrainType};

/// Number of healing tiers; healer levels run from 1 to this value.
pub const HEAL_TIERS: usize = 5;

/// Maximum number of battle items a soldier's equipped-item bitset can track.
pub const MAX_BATTLE_ITEMS: usize = 64;

/// Serialized form of a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesetDef {
    /// Battle switches.
    pub config: BattleConfig,
    /// Items and skills with a fixed role.
    pub designated: Designated,
    /// Healing tiers for levels 1 to 5. Empty disables healing.
    pub heal_tiers: Vec<HealTier>,
    /// The item catalog, in catalog order.
    pub items: Vec<ItemType>,
    /// Weapon table.
    pub weapons: Vec<WeaponType>,
    /// Armor table.
    pub armors: Vec<ArmorType>,
    /// Mount table.
    pub mounts: Vec<MountType>,
    /// Monster table.
    pub monsters: Vec<MonsterType>,
    /// Battle item table.
    pub battle_items: Vec<BattleItemType>,
    /// Skill table.
    pub skills: Vec<SkillType>,
    /// Special ability table.
    pub specials: Vec<SpecialType>,
    /// Effect table.
    pub effects: Vec<EffectType>,
    /// Building and ship types.
    pub objects: Vec<ObjectType>,
    /// Terrain types.
    pub terrains: Vec<TerrainType>,
}

/// Designated items and skills, resolved to ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesignatedIds {
    /// Silver.
    pub silver: Option<ItemId>,
    /// Herbs.
    pub herbs: Option<ItemId>,
    /// Healing potion.
    pub healing_potion: Option<ItemId>,
    /// Amulet of invulnerability.
    pub amulet: Option<ItemId>,
    /// Ring of invisibility.
    pub ring: Option<ItemId>,
    /// Amulet of true seeing.
    pub true_seeing: Option<ItemId>,
    /// Raised undead.
    pub raised_undead: Option<ItemId>,
    /// Combat skill.
    pub combat_skill: Option<SkillId>,
    /// Tactics skill.
    pub tactics_skill: Option<SkillId>,
    /// Healing skill.
    pub healing_skill: Option<SkillId>,
    /// Magical healing skill.
    pub magical_healing_skill: Option<SkillId>,
}

/// Per-item positions in the equipment tables.
#[derive(Debug, Clone, Copy, Default)]
struct ItemSlots {
    weapon: Option<usize>,
    armor: Option<usize>,
    mount: Option<usize>,
    monster: Option<usize>,
    battle: Option<usize>,
}

/// Loaded, validated rule tables.
#[derive(Debug, Clone)]
pub struct Ruleset {
    config: BattleConfig,
    designated: DesignatedIds,
    heal_tiers: [HealTier; HEAL_TIERS],
    items: Vec<ItemType>,
    slots: Vec<ItemSlots>,
    weapons: Vec<WeaponType>,
    armors: Vec<ArmorType>,
    mounts: Vec<MountType>,
    monsters: Vec<MonsterType>,
    battle_items: Vec<BattleItemType>,
    skills: Vec<SkillType>,
    specials: Vec<SpecialType>,
    effects: Vec<EffectType>,
    objects: Vec<ObjectType>,
    terrains: Vec<TerrainType>,
    item_index: HashMap<String, ItemId>,
    skill_index: HashMap<String, SkillId>,
    special_index: HashMap<String, SpecialId>,
    effect_index: HashMap<String, EffectId>,
    object_index: HashMap<String, ObjectTypeId>,
    terrain_index: HashMap<String, TerrainId>,
}

// =============================================================================
// Loading
// =============================================================================

/// Builds a key → id index, rejecting duplicates and oversized tables.
fn index_table<T, I>(
    table: &'static str,
    entries: &[T],
    key: impl Fn(&T) -> &str,
    make: impl Fn(u16) -> I,
) -> Result<HashMap<String, I>, RulesError> {
    let mut index = HashMap::with_capacity(entries.len());
    for (pos, entry) in entries.iter().enumerate() {
        let raw = u16::try_from(pos).map_err(|_| RulesError::TooManyEntries {
            table,
            count: entries.len(),
        })?;
        let k = key(entry).to_string();
        if index.contains_key(&k) {
            return Err(RulesError::Duplicate { table, key: k });
        }
        index.insert(k, make(raw));
    }
    Ok(index)
}

/// Reference checker shared by all validation passes.
struct Refs<'a> {
    items: &'a HashMap<String, ItemId>,
    skills: &'a HashMap<String, SkillId>,
    specials: &'a HashMap<String, SpecialId>,
    effects: &'a HashMap<String, EffectId>,
    objects: &'a HashMap<String, ObjectTypeId>,
}

impl Refs<'_> {
    fn check(
        map_has: bool,
        table: &'static str,
        owner: &str,
        kind: &'static str,
        key: &str,
    ) -> Result<(), RulesError> {
        if map_has {
            Ok(())
        } else {
            Err(RulesError::UnknownReference {
                table,
                owner: owner.to_string(),
                kind,
                key: key.to_string(),
            })
        }
    }

    fn item(&self, table: &'static str, owner: &str, key: &str) -> Result<ItemId, RulesError> {
        self.items
            .get(key)
            .copied()
            .ok_or_else(|| RulesError::UnknownReference {
                table,
                owner: owner.to_string(),
                kind: "item",
                key: key.to_string(),
            })
    }

    fn skill(&self, table: &'static str, owner: &str, key: Option<&str>) -> Result<(), RulesError> {
        match key {
            Some(k) => Self::check(self.skills.contains_key(k), table, owner, "skill", k),
            None => Ok(()),
        }
    }

    fn special(&self, table: &'static str, owner: &str, key: Option<&str>) -> Result<(), RulesError> {
        match key {
            Some(k) => Self::check(self.specials.contains_key(k), table, owner, "special", k),
            None => Ok(()),
        }
    }

    fn effect(&self, table: &'static str, owner: &str, key: Option<&str>) -> Result<(), RulesError> {
        match key {
            Some(k) => Self::check(self.effects.contains_key(k), table, owner, "effect", k),
            None => Ok(()),
        }
    }

    fn object(&self, table: &'static str, owner: &str, key: &str) -> Result<(), RulesError> {
        Self::check(self.objects.contains_key(key), table, owner, "object", key)
    }
}

/// Fills one equipment slot for every entry of a table.
fn assign_slots<T>(
    refs: &Refs<'_>,
    table: &'static str,
    entries: &[T],
    item_of: impl Fn(&T) -> &str,
    slots: &mut [ItemSlots],
    slot: impl Fn(&mut ItemSlots) -> &mut Option<usize>,
) -> Result<(), RulesError> {
    for (pos, entry) in entries.iter().enumerate() {
        let abbr = item_of(entry);
        let id = refs.item(table, abbr, abbr)?;
        let target = slot(&mut slots[id.index()]);
        if target.is_some() {
            return Err(RulesError::Duplicate {
                table,
                key: abbr.to_string(),
            });
        }
        *target = Some(pos);
    }
    Ok(())
}

impl Ruleset {
    /// Parses and validates a ruleset from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] when the text is malformed or a table fails
    /// validation.
    pub fn from_json_str(text: &str) -> Result<Self, RulesError> {
        let def: RulesetDef = serde_json::from_str(text)?;
        Self::from_def(def)
    }

    /// Validates a ruleset definition and builds the lookup indices.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] on duplicate keys, dangling references, too
    /// many battle items or a wrong number of heal tiers.
    pub fn from_def(def: RulesetDef) -> Result<Self, RulesError> {
        let item_index = index_table("item", &def.items, |i| i.abbr.as_str(), ItemId::new)?;
        let skill_index = index_table("skill", &def.skills, |s| s.abbr.as_str(), SkillId::new)?;
        let special_index = index_table("special", &def.specials, |s| s.key.as_str(), SpecialId::new)?;
        let effect_index = index_table("effect", &def.effects, |e| e.name.as_str(), EffectId::new)?;
        let object_index = index_table("object", &def.objects, |o| o.name.as_str(), ObjectTypeId::new)?;
        let terrain_index = index_table("terrain", &def.terrains, |t| t.name.as_str(), TerrainId::new)?;

        if def.battle_items.len() > MAX_BATTLE_ITEMS {
            return Err(RulesError::TooManyBattleItems {
                count: def.battle_items.len(),
                max: MAX_BATTLE_ITEMS,
            });
        }

        let heal_tiers = match def.heal_tiers.len() {
            0 => [HealTier::default(); HEAL_TIERS],
            HEAL_TIERS => {
                let mut tiers = [HealTier::default(); HEAL_TIERS];
                tiers.copy_from_slice(&def.heal_tiers);
                tiers
            }
            found => {
                return Err(RulesError::HealTiers {
                    expected: HEAL_TIERS,
                    found,
                })
            }
        };

        let refs = Refs {
            items: &item_index,
            skills: &skill_index,
            specials: &special_index,
            effects: &effect_index,
            objects: &object_index,
        };

        let mut slots = vec![ItemSlots::default(); def.items.len()];
        assign_slots(&refs, "weapon", &def.weapons, |w| w.item.as_str(), &mut slots, |s| &mut s.weapon)?;
        assign_slots(&refs, "armor", &def.armors, |a| a.item.as_str(), &mut slots, |s| &mut s.armor)?;
        assign_slots(&refs, "mount", &def.mounts, |m| m.item.as_str(), &mut slots, |s| &mut s.mount)?;
        assign_slots(&refs, "monster", &def.monsters, |m| m.item.as_str(), &mut slots, |s| &mut s.monster)?;
        assign_slots(&refs, "battle item", &def.battle_items, |b| b.item.as_str(), &mut slots, |s| &mut s.battle)?;

        for w in &def.weapons {
            refs.skill("weapon", &w.item, w.base_skill.as_deref())?;
            refs.skill("weapon", &w.item, w.or_skill.as_deref())?;
        }
        for m in &def.mounts {
            refs.skill("mount", &m.item, m.skill.as_deref())?;
            refs.special("mount", &m.item, m.special.as_deref())?;
        }
        for m in &def.monsters {
            refs.special("monster", &m.item, m.special.as_deref())?;
        }
        for b in &def.battle_items {
            refs.special("battle item", &b.item, b.special.as_deref())?;
        }
        for s in &def.skills {
            refs.special("skill", &s.abbr, s.special.as_deref())?;
        }
        for e in &def.effects {
            refs.effect("effect", &e.name, e.cancel.as_deref())?;
        }
        for sp in &def.specials {
            for b in &sp.buildings {
                refs.object("special", &sp.key, b)?;
            }
            for t in &sp.targets {
                refs.item("special", &sp.key, t)?;
            }
            for e in &sp.effects {
                refs.effect("special", &sp.key, Some(e))?;
            }
            for d in &sp.damage {
                refs.effect("special", &sp.key, d.effect.as_deref())?;
            }
        }

        let des = &def.designated;
        let item_of = |key: &Option<String>| -> Result<Option<ItemId>, RulesError> {
            key.as_deref()
                .map(|k| refs.item("designated", k, k))
                .transpose()
        };
        let skill_of = |key: &Option<String>| -> Result<Option<SkillId>, RulesError> {
            match key.as_deref() {
                Some(k) => skill_index
                    .get(k)
                    .copied()
                    .map(Some)
                    .ok_or_else(|| RulesError::UnknownReference {
                        table: "designated",
                        owner: k.to_string(),
                        kind: "skill",
                        key: k.to_string(),
                    }),
                None => Ok(None),
            }
        };
        let designated = DesignatedIds {
            silver: item_of(&des.silver)?,
            herbs: item_of(&des.herbs)?,
            healing_potion: item_of(&des.healing_potion)?,
            amulet: item_of(&des.amulet)?,
            ring: item_of(&des.ring)?,
            true_seeing: item_of(&des.true_seeing)?,
            raised_undead: item_of(&des.raised_undead)?,
            combat_skill: skill_of(&des.combat_skill)?,
            tactics_skill: skill_of(&des.tactics_skill)?,
            healing_skill: skill_of(&des.healing_skill)?,
            magical_healing_skill: skill_of(&des.magical_healing_skill)?,
        };

        debug!(
            items = def.items.len(),
            specials = def.specials.len(),
            effects = def.effects.len(),
            "ruleset loaded"
        );

        Ok(Self {
            config: def.config,
            designated,
            heal_tiers,
            items: def.items,
            slots,
            weapons: def.weapons,
            armors: def.armors,
            mounts: def.mounts,
            monsters: def.monsters,
            battle_items: def.battle_items,
            skills: def.skills,
            specials: def.specials,
            effects: def.effects,
            objects: def.objects,
            terrains: def.terrains,
            item_index,
            skill_index,
            special_index,
            effect_index,
            object_index,
            terrain_index,
        })
    }
}

// =============================================================================
// Lookups
// =============================================================================

impl Ruleset {
    /// Battle switches.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Designated items and skills.
    #[must_use]
    pub fn designated(&self) -> &DesignatedIds {
        &self.designated
    }

    /// Healing tier for a healer level in `1..=5`; other levels get an
    /// empty tier.
    #[must_use]
    pub fn heal_tier(&self, level: usize) -> HealTier {
        level
            .checked_sub(1)
            .and_then(|i| self.heal_tiers.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Item ids in catalog order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        // Table length was checked against u16 at load.
        (0..self.items.len()).map(|i| ItemId::new(i as u16))
    }

    /// Looks up an item by abbreviation.
    #[must_use]
    pub fn find_item(&self, abbr: &str) -> Option<ItemId> {
        self.item_index.get(abbr).copied()
    }

    /// The catalog entry for an item.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different ruleset.
    #[must_use]
    pub fn item(&self, id: ItemId) -> &ItemType {
        &self.items[id.index()]
    }

    fn slot(&self, id: ItemId) -> ItemSlots {
        self.slots.get(id.index()).copied().unwrap_or_default()
    }

    /// Weapon record of an item, if it is a weapon.
    #[must_use]
    pub fn weapon(&self, id: ItemId) -> Option<&WeaponType> {
        self.slot(id).weapon.map(|i| &self.weapons[i])
    }

    /// Armor record of an item, if it is armor.
    #[must_use]
    pub fn armor(&self, id: ItemId) -> Option<&ArmorType> {
        self.slot(id).armor.map(|i| &self.armors[i])
    }

    /// Mount record of an item, if it is a mount.
    #[must_use]
    pub fn mount(&self, id: ItemId) -> Option<&MountType> {
        self.slot(id).mount.map(|i| &self.mounts[i])
    }

    /// Monster record of an item, if it is a monster.
    #[must_use]
    pub fn monster(&self, id: ItemId) -> Option<&MonsterType> {
        self.slot(id).monster.map(|i| &self.monsters[i])
    }

    /// Battle item record of an item, if it is a battle item.
    #[must_use]
    pub fn battle_item(&self, id: ItemId) -> Option<&BattleItemType> {
        self.slot(id).battle.map(|i| &self.battle_items[i])
    }

    /// Position of a battle item in the battle item table, used as its bit
    /// in a soldier's equipped-item set.
    #[must_use]
    pub fn battle_item_slot(&self, id: ItemId) -> Option<usize> {
        self.slot(id).battle
    }

    /// Battle items in table order, paired with their item ids.
    pub fn battle_items(&self) -> impl Iterator<Item = (ItemId, &BattleItemType)> + '_ {
        self.battle_items
            .iter()
            .filter_map(|b| self.find_item(&b.item).map(|id| (id, b)))
    }

    /// Looks up a skill by abbreviation.
    #[must_use]
    pub fn find_skill(&self, abbr: &str) -> Option<SkillId> {
        self.skill_index.get(abbr).copied()
    }

    /// The skill table entry for a skill.
    #[must_use]
    pub fn skill(&self, id: SkillId) -> &SkillType {
        &self.skills[id.index()]
    }

    /// Looks up a special ability by key.
    #[must_use]
    pub fn find_special(&self, key: &str) -> Option<SpecialId> {
        self.special_index.get(key).copied()
    }

    /// The special table entry for a special ability.
    #[must_use]
    pub fn special(&self, id: SpecialId) -> &SpecialType {
        &self.specials[id.index()]
    }

    /// Looks up an effect by name.
    #[must_use]
    pub fn find_effect(&self, name: &str) -> Option<EffectId> {
        self.effect_index.get(name).copied()
    }

    /// The effect table entry for an effect.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> &EffectType {
        &self.effects[id.index()]
    }

    /// Number of effects in the effect table.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Effect ids in table order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn effect_ids(&self) -> impl Iterator<Item = EffectId> + '_ {
        (0..self.effects.len()).map(|i| EffectId::new(i as u16))
    }

    /// Looks up an object type by name.
    #[must_use]
    pub fn find_object(&self, name: &str) -> Option<ObjectTypeId> {
        self.object_index.get(name).copied()
    }

    /// The object table entry for an object type.
    #[must_use]
    pub fn object(&self, id: ObjectTypeId) -> &ObjectType {
        &self.objects[id.index()]
    }

    /// Looks up a terrain type by name.
    #[must_use]
    pub fn find_terrain(&self, name: &str) -> Option<TerrainId> {
        self.terrain_index.get(name).copied()
    }

    /// The terrain table entry for a terrain type.
    #[must_use]
    pub fn terrain(&self, id: TerrainId) -> &TerrainType {
        &self.terrains[id.index()]
    }
}
