//! Battle-ready combatants.
//!
//! A [`Soldier`] is derived from one man or monster in a unit's inventory.
//! Construction picks its equipment, combat spell and battle items and takes
//! them out of the unit's inventory; settlement puts back whatever survived.
//!
//! # Construction order
//!
//! 1. Building cover, while the object still has protection capacity
//! 2. Monsters copy their table stats and stop here
//! 3. Healing capacity
//! 4. Combat spell
//! 5. Battle items
//! 6. Armor, mount and weapon

mod effects;
mod equipment;

use serde::{Deserialize, Serialize};
use warhost_rules::{
    AttackType, ItemId, MonsterType, ObjectTypeId, Ruleset, SpecialId, TerrainType, WeaponClass,
    MAX_BATTLE_ITEMS,
};

use crate::rng::RandomSource;
use crate::world::{Object, ObjectId, Unit, UnitId};

/// Starting defense before any bonus, indexed by [`AttackType::index`].
const BASE_DEFENSE: [i32; AttackType::COUNT] = [0, -2, -2, -2, 0, 0];

/// One combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soldier {
    /// Narration name, the owning unit's display name.
    pub name: String,
    /// Owning unit.
    pub unit: UnitId,
    /// Object the owning unit stands in.
    pub object: Option<ObjectId>,
    /// Type of the building protecting this soldier, if it got cover.
    pub building: Option<ObjectTypeId>,
    /// The man or monster item this soldier was made from.
    pub race: ItemId,
    /// Wielded weapon.
    pub weapon: Option<ItemId>,
    /// Worn armor.
    pub armor: Option<ItemId>,
    /// Ridden mount.
    pub riding: Option<ItemId>,
    /// Riding skill bonus from the mount.
    pub riding_bonus: i32,
    /// Attack skill.
    pub attack_skill: i32,
    /// Weapon attacks per round; negative means one every `|n|` rounds.
    pub attacks: i32,
    /// Attack type of weapon attacks.
    pub attack_type: AttackType,
    /// Special ability, from a monster, spell or item.
    pub special: Option<SpecialId>,
    /// Level of the special ability.
    pub special_level: i32,
    /// Defense skill per attack type.
    pub defense: [i32; AttackType::COUNT],
    /// Building protection per attack type under advanced forts.
    pub protection: [i32; AttackType::COUNT],
    /// Hits left.
    pub hits: i32,
    /// Hits at full health.
    pub max_hits: i32,
    /// Hits taken since the last damage report.
    pub damage: i32,
    /// Hits regained each round.
    pub regen: i32,
    /// Healer tier, 0 for none.
    pub heal_level: usize,
    /// Treatments left.
    pub healing: i32,
    /// Item consumed to heal: herbs, a potion, or `None` for magic.
    pub heal_item: Option<ItemId>,
    /// False once a treatment failed or the body rose as undead.
    pub can_be_healed: bool,
    /// Equipped battle items, one bit per battle item table position.
    pub battle_items: u64,
    /// Wears an amulet of invulnerability.
    pub amulet: bool,
    effects: Vec<bool>,
}

impl Soldier {
    /// Derives a soldier from one `race` item of `unit`.
    ///
    /// Takes equipment out of `unit`'s inventory and uses up one place of
    /// `object`'s protection capacity when there is any left. Missing or
    /// unusable equipment only weakens the soldier; construction never
    /// fails.
    ///
    /// # Arguments
    ///
    /// * `rules` - The ruleset
    /// * `unit` - Owning unit
    /// * `object` - Building or ship the unit stands in
    /// * `terrain` - Terrain of the battle region
    /// * `race` - Man or monster item this soldier is made from
    /// * `assassination` - Restricts armor to assassination-safe kinds
    #[must_use]
    pub fn new(
        rules: &Ruleset,
        unit: &mut Unit,
        object: Option<&mut Object>,
        terrain: &TerrainType,
        race: ItemId,
        assassination: bool,
    ) -> Self {
        let hits = rules.item(race).hits.max(1);
        let mut soldier = Self {
            name: unit.display_name(),
            unit: unit.id,
            object: object.as_ref().map(|o| o.id),
            building: None,
            race,
            weapon: None,
            armor: None,
            riding: None,
            riding_bonus: 0,
            attack_skill: 0,
            attacks: 1,
            attack_type: AttackType::Combat,
            special: None,
            special_level: 0,
            defense: BASE_DEFENSE,
            protection: [0; AttackType::COUNT],
            hits,
            max_hits: hits,
            damage: 0,
            regen: 0,
            heal_level: 0,
            healing: 0,
            heal_item: None,
            can_be_healed: true,
            battle_items: 0,
            amulet: false,
            effects: vec![false; rules.effect_count()],
        };

        if let Some(obj) = object {
            soldier.take_cover(rules, obj);
        }

        if let Some(monster) = rules.monster(race) {
            soldier.setup_monster(rules, monster);
            return soldier;
        }

        soldier.setup_healing(rules, unit);
        soldier.setup_spell(rules, unit);
        soldier.setup_combat_items(rules, unit);
        soldier.setup_equipment(rules, unit, terrain, assassination);
        soldier
    }

    /// Applies the object's defense bonus if it can still protect one more
    /// man.
    fn take_cover(&mut self, rules: &Ruleset, obj: &mut Object) {
        let Some(kind) = obj.kind else {
            return;
        };
        if obj.capacity == 0 {
            return;
        }
        obj.capacity -= 1;
        self.building = Some(kind);

        let bonus = rules.object(kind).defense;
        let target = if rules.config().advanced_forts {
            &mut self.protection
        } else {
            &mut self.defense
        };
        for (d, b) in target.iter_mut().zip(bonus) {
            *d += b;
        }

        if obj.runes > 0 {
            for t in [AttackType::Energy, AttackType::Spirit] {
                let d = &mut self.defense[t.index()];
                *d = (*d).max(obj.runes);
            }
        }
    }

    fn setup_monster(&mut self, rules: &Ruleset, monster: &MonsterType) {
        self.attack_skill = monster.attack_level;
        for t in AttackType::ALL {
            let i = t.index();
            if t.is_magical() {
                self.defense[i] = self.defense[i].max(monster.defense[i]);
            } else {
                self.defense[i] += monster.defense[i];
            }
        }
        self.hits = monster.hits.max(1);
        self.max_hits = self.hits;
        self.attacks = monster.attacks.max(1);
        self.special = monster
            .special
            .as_deref()
            .and_then(|k| rules.find_special(k));
        self.special_level = monster.special_level;
        if rules.config().monster_battle_regen {
            self.regen = monster.regen;
        }
    }

    /// Rolls an armor save against a hit of `class`.
    ///
    /// No draw is taken when the soldier wears no armor or the armor gives
    /// no save against this class.
    pub fn armor_protect(
        &self,
        rules: &Ruleset,
        class: WeaponClass,
        rng: &mut dyn RandomSource,
    ) -> bool {
        let Some(armor) = self.armor.and_then(|a| rules.armor(a)) else {
            return false;
        };
        let chance = armor.saves[class.index()];
        if chance <= 0 {
            return false;
        }
        chance > rng.roll(armor.from)
    }

    /// True if the soldier carries the battle item at table position
    /// `slot`.
    #[must_use]
    pub fn has_battle_item(&self, slot: usize) -> bool {
        slot < MAX_BATTLE_ITEMS && self.battle_items & (1u64 << slot) != 0
    }

    /// Defense against `attack_type`.
    #[must_use]
    pub fn defense_against(&self, attack_type: AttackType) -> i32 {
        self.defense[attack_type.index()]
    }
}
