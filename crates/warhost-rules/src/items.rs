//! The item catalog.
//!
//! Everything a unit can carry is an item: men, monsters, weapons, armor,
//! mounts, battle items, trade goods and silver. An item's [`ItemKind`]
//! decides which combat tables it may also appear in.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Classification bits of an item.
    ///
    /// Serialized as a `"MAN | LEADER"` style string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ItemKind: u32 {
        /// Ordinary produced goods.
        const NORMAL = 1 << 0;
        /// Goods that need advanced production skills.
        const ADVANCED = 1 << 1;
        /// Trade goods.
        const TRADE = 1 << 2;
        /// A man type; every man in a unit becomes one soldier.
        const MAN = 1 << 3;
        /// A leader man type.
        const LEADER = 1 << 4;
        /// A monster type; fights with stats from the monster table.
        const MONSTER = 1 << 5;
        /// Magical items.
        const MAGIC = 1 << 6;
        /// Listed in the weapon table.
        const WEAPON = 1 << 7;
        /// Listed in the armor table.
        const ARMOR = 1 << 8;
        /// Listed in the mount table.
        const MOUNT = 1 << 9;
        /// Listed in the battle item table.
        const BATTLE = 1 << 10;
        /// Never produced or found; excluded from random spoils.
        const SPECIAL = 1 << 11;
        /// Conjured monsters that only illusion-targeting specials can hit.
        const ILLUSION = 1 << 12;
        /// Undead monsters; their kills can raise new undead.
        const UNDEAD = 1 << 13;
        /// Unfinished ships carried in inventory.
        const SHIP = 1 << 14;
        /// Dropped items of this type always become spoils in full.
        const ALWAYS_SPOIL = 1 << 15;
        /// Dropped items of this type never become spoils.
        const NEVER_SPOIL = 1 << 16;
    }
}

impl ItemKind {
    /// Returns true if this kind produces soldiers in an army.
    #[must_use]
    pub const fn is_soldier(self) -> bool {
        self.intersects(Self::MAN.union(Self::MONSTER))
    }
}

fn default_hits() -> i32 {
    1
}

/// One entry in the item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    /// Unique abbreviation, e.g. `"SWOR"`.
    pub abbr: String,
    /// Singular display name.
    pub name: String,
    /// Plural display name. Empty means `name` with an `s` appended.
    #[serde(default)]
    pub plural: String,
    /// Classification bits.
    #[serde(default)]
    pub kind: ItemKind,
    /// Weight of one item.
    #[serde(default)]
    pub weight: u32,
    /// Market price of one item; divides monster spoil value into counts.
    #[serde(default)]
    pub base_price: u32,
    /// Carrying capacity when walking, including the item itself.
    #[serde(default)]
    pub walk: u32,
    /// Carrying capacity when riding.
    #[serde(default)]
    pub ride: u32,
    /// Carrying capacity when flying.
    #[serde(default)]
    pub fly: u32,
    /// Base toughness of a man type.
    #[serde(default = "default_hits")]
    pub hits: i32,
    /// Months of work needed to finish a ship of this type.
    #[serde(default)]
    pub ship_months: u32,
    /// Disabled items exist in the catalog but are unusable.
    #[serde(default)]
    pub disabled: bool,
}

impl ItemType {
    /// Creates an item with the given abbreviation, name and kind.
    #[must_use]
    pub fn new(abbr: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            abbr: abbr.to_string(),
            name: name.to_string(),
            plural: String::new(),
            kind,
            weight: 0,
            base_price: 0,
            walk: 0,
            ride: 0,
            fly: 0,
            hits: 1,
            ship_months: 0,
            disabled: false,
        }
    }

    /// Returns the display name for `count` items.
    #[must_use]
    pub fn display_name(&self, count: u32) -> String {
        if count == 1 {
            self.name.clone()
        } else if self.plural.is_empty() {
            format!("{}s", self.name)
        } else {
            self.plural.clone()
        }
    }
}
