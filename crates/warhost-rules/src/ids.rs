//! Typed indices into the ruleset tables.
//!
//! Every table in a [`Ruleset`](crate::Ruleset) is a catalog-ordered `Vec`.
//! Ids are positions in those vectors, assigned once at load time, so they are
//! stable for the lifetime of a ruleset and cheap to copy and compare.
//!
//! Ids are only minted by the ruleset that owns the table. Mixing ids between
//! two different rulesets is a logic error.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u16);

        impl $name {
            /// Creates an id from a raw table position.
            #[must_use]
            pub const fn new(index: u16) -> Self {
                Self(index)
            }

            /// Returns the table position as a `usize` for indexing.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

table_id!(
    /// Position of an item in the item catalog.
    ///
    /// Catalog order matters: equipment fallback scans and monster spoil
    /// selection walk items in this order.
    ItemId,
    "ItemId"
);

table_id!(
    /// Position of a skill in the skill table.
    SkillId,
    "SkillId"
);

table_id!(
    /// Position of a special ability in the specials table.
    SpecialId,
    "SpecialId"
);

table_id!(
    /// Position of an effect in the effects table.
    EffectId,
    "EffectId"
);

table_id!(
    /// Position of a building or ship type in the object table.
    ObjectTypeId,
    "ObjectTypeId"
);

table_id!(
    /// Position of a terrain type in the terrain table.
    TerrainId,
    "TerrainId"
);
