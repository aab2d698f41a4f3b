//! Object (building and ship) types and terrain types.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::combat::AttackType;

/// A building or ship type.
///
/// The first `protect` men inside an object of this type receive `defense`
/// added to their defense numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    /// Unique name.
    pub name: String,
    /// Number of men protected.
    #[serde(default)]
    pub protect: u32,
    /// Defense bonus indexed by [`AttackType::index`].
    #[serde(default)]
    pub defense: [i32; AttackType::COUNT],
}

bitflags! {
    /// Terrain behaviour bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TerrainFlags: u32 {
        /// Riding mounts may be used in battle.
        const RIDINGMOUNTS = 1 << 0;
        /// Flying mounts may be used in battle.
        const FLYINGMOUNTS = 1 << 1;
    }
}

/// A terrain type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainType {
    /// Unique name.
    pub name: String,
    /// Behaviour bits.
    #[serde(default)]
    pub flags: TerrainFlags,
}

impl TerrainType {
    /// Flying mounts work here.
    #[must_use]
    pub fn allows_flying(&self) -> bool {
        self.flags.contains(TerrainFlags::FLYINGMOUNTS)
    }

    /// Riding mounts work here.
    #[must_use]
    pub fn allows_riding(&self) -> bool {
        self.flags.contains(TerrainFlags::RIDINGMOUNTS)
    }
}
