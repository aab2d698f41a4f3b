//! The persistent game objects a battle reads and writes back to.
//!
//! The combat engine never owns units. Soldiers and armies refer to them by
//! [`UnitId`] and [`ObjectId`] handles, resolved through the [`World`]
//! registry. A handle must stay valid for the whole engagement.

mod object;
mod unit;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use warhost_rules::{ItemId, Ruleset, TerrainId};

pub use object::Object;
pub use unit::{GuardStatus, SpoilsMode, Unit, UnitFlags, UnitKind};

// =============================================================================
// Handles
// =============================================================================

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a handle from its number.
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Returns the raw number.
            #[must_use]
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self::new(id)
            }
        }
    };
}

handle!(
    /// Game number of a unit.
    UnitId
);
handle!(
    /// Game number of a faction.
    FactionId
);
handle!(
    /// Game number of a building or ship.
    ObjectId
);

// =============================================================================
// Item lists
// =============================================================================

/// Item stacks keyed by item id, iterated in catalog order.
///
/// Stacks never hold zero; setting a count to zero removes the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemList {
    stacks: BTreeMap<ItemId, u32>,
}

impl ItemList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of one item.
    #[must_use]
    pub fn get(&self, item: ItemId) -> u32 {
        self.stacks.get(&item).copied().unwrap_or(0)
    }

    /// Sets the count of one item.
    pub fn set(&mut self, item: ItemId, count: u32) {
        if count == 0 {
            self.stacks.remove(&item);
        } else {
            self.stacks.insert(item, count);
        }
    }

    /// Adds to the count of one item.
    pub fn add(&mut self, item: ItemId, count: u32) {
        if count > 0 {
            *self.stacks.entry(item).or_insert(0) += count;
        }
    }

    /// Removes up to `count` of one item and returns how many were removed.
    pub fn take(&mut self, item: ItemId, count: u32) -> u32 {
        let have = self.get(item);
        let taken = have.min(count);
        self.set(item, have - taken);
        taken
    }

    /// Stacks in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.stacks.iter().map(|(&id, &n)| (id, n))
    }

    /// True when no stack is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Total number of items over all stacks.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.stacks.values().map(|&n| u64::from(n)).sum()
    }

    /// Renders the list as `"3 swords [SWOR], 20 silver [SILV]"`, or
    /// `"none"` when empty.
    #[must_use]
    pub fn report(&self, rules: &Ruleset) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        self.iter()
            .map(|(id, n)| {
                let item = rules.item(id);
                format!("{} {} [{}]", n, item.display_name(n), item.abbr)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// =============================================================================
// Regions, factions, locations
// =============================================================================

/// The region a battle is fought in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Display name, e.g. `"plain (12,4) in Ilmarin"`.
    pub name: String,
    /// Terrain type.
    pub terrain: TerrainId,
    /// No attacks are allowed in safe regions.
    pub safe: bool,
}

/// A player faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    /// Game number.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Factions this one has declared allied.
    pub allies: BTreeSet<FactionId>,
}

impl Faction {
    /// Creates a faction with no allies.
    #[must_use]
    pub fn new(id: FactionId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            allies: BTreeSet::new(),
        }
    }
}

/// One entry of a battle roster: a unit and the object it stands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The fighting unit.
    pub unit: UnitId,
    /// Building or ship the unit is in; `None` is open ground.
    pub object: Option<ObjectId>,
}

impl Location {
    /// A unit standing in open ground.
    #[must_use]
    pub const fn open(unit: UnitId) -> Self {
        Self { unit, object: None }
    }

    /// A unit inside an object.
    #[must_use]
    pub const fn inside(unit: UnitId, object: ObjectId) -> Self {
        Self {
            unit,
            object: Some(object),
        }
    }
}

// =============================================================================
// World
// =============================================================================

/// Registry of the units, objects and factions a battle touches.
///
/// Iteration is in id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    units: BTreeMap<UnitId, Unit>,
    objects: BTreeMap<ObjectId, Object>,
    factions: BTreeMap<FactionId, Faction>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a unit.
    pub fn insert_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Adds or replaces an object.
    pub fn insert_object(&mut self, object: Object) {
        self.objects.insert(object.id, object);
    }

    /// Adds or replaces a faction.
    pub fn insert_faction(&mut self, faction: Faction) {
        self.factions.insert(faction.id, faction);
    }

    /// Looks up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Looks up a unit for writing.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Looks up an object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Looks up a faction.
    #[must_use]
    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Borrows a unit and the object it stands in at the same time.
    pub fn unit_and_object_mut(
        &mut self,
        unit: UnitId,
        object: Option<ObjectId>,
    ) -> Option<(&mut Unit, Option<&mut Object>)> {
        let u = self.units.get_mut(&unit)?;
        let o = object.and_then(|id| self.objects.get_mut(&id));
        Some((u, o))
    }

    /// True if faction `of` counts faction `other` as a friend: the same
    /// faction, or one it has declared allied.
    #[must_use]
    pub fn is_friendly(&self, of: FactionId, other: FactionId) -> bool {
        of == other
            || self
                .factions
                .get(&of)
                .is_some_and(|f| f.allies.contains(&other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod item_list {
        use super::*;

        #[test]
        fn zero_counts_are_dropped() {
            let mut list = ItemList::new();
            list.set(ItemId::new(3), 2);
            list.set(ItemId::new(3), 0);
            assert!(list.is_empty());
        }

        #[test]
        fn take_is_bounded() {
            let mut list = ItemList::new();
            list.add(ItemId::new(1), 5);
            assert_eq!(list.take(ItemId::new(1), 3), 3);
            assert_eq!(list.take(ItemId::new(1), 9), 2);
            assert_eq!(list.get(ItemId::new(1)), 0);
            assert_eq!(list.take(ItemId::new(2), 1), 0);
        }

        #[test]
        fn iterates_in_catalog_order() {
            let mut list = ItemList::new();
            list.add(ItemId::new(9), 1);
            list.add(ItemId::new(2), 4);
            let ids: Vec<_> = list.iter().map(|(id, _)| id.index()).collect();
            assert_eq!(ids, [2, 9]);
            assert_eq!(list.total(), 5);
        }
    }

    mod registry {
        use super::*;

        #[test]
        fn friendliness_is_one_way() {
            let mut world = World::new();
            let mut a = Faction::new(FactionId::new(1), "Red");
            a.allies.insert(FactionId::new(2));
            world.insert_faction(a);
            world.insert_faction(Faction::new(FactionId::new(2), "Blue"));

            assert!(world.is_friendly(FactionId::new(1), FactionId::new(1)));
            assert!(world.is_friendly(FactionId::new(1), FactionId::new(2)));
            assert!(!world.is_friendly(FactionId::new(2), FactionId::new(1)));
        }

        #[test]
        fn handles_debug_with_type_name() {
            assert_eq!(format!("{:?}", UnitId::new(12)), "UnitId(12)");
            assert_eq!(UnitId::from(12).to_string(), "12");
        }
    }
}
