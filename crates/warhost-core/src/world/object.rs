use serde::{Deserialize, Serialize};
use warhost_rules::{ObjectTypeId, Ruleset};

use super::ObjectId;

/// A building or ship standing in a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Game number.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Object type; `None` for open ground.
    pub kind: Option<ObjectTypeId>,
    /// Men the object can still protect in the current battle.
    pub capacity: u32,
    /// Runes of warding level; raises energy and spirit defense.
    #[serde(default)]
    pub runes: i32,
}

impl Object {
    /// Creates an object with its full protection capacity.
    #[must_use]
    pub fn new(id: ObjectId, name: &str, kind: Option<ObjectTypeId>, rules: &Ruleset) -> Self {
        let capacity = kind.map_or(0, |k| rules.object(k).protect);
        Self {
            id,
            name: name.to_string(),
            kind,
            capacity,
            runes: 0,
        }
    }
}
