//! Ruleset loading errors.

use thiserror::Error;

/// Reasons a ruleset fails to load.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The ruleset text is not valid JSON for a [`RulesetDef`](crate::RulesetDef).
    #[error("malformed ruleset: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entries of one table share a key.
    #[error("duplicate {table} entry {key:?}")]
    Duplicate {
        /// Table name.
        table: &'static str,
        /// The repeated key.
        key: String,
    },

    /// An entry names something that does not exist.
    #[error("{table} entry {owner:?} references unknown {kind} {key:?}")]
    UnknownReference {
        /// Table holding the bad reference.
        table: &'static str,
        /// Key of the entry holding the bad reference.
        owner: String,
        /// Kind of thing referenced.
        kind: &'static str,
        /// The unresolved key.
        key: String,
    },

    /// A table has more entries than its id type can address.
    #[error("{table} table has {count} entries, more than ids can address")]
    TooManyEntries {
        /// Table name.
        table: &'static str,
        /// Entry count.
        count: usize,
    },

    /// More battle items than the equipped-item bitset holds.
    #[error("{count} battle items defined, at most {max} supported")]
    TooManyBattleItems {
        /// Battle items defined.
        count: usize,
        /// Bitset width.
        max: usize,
    },

    /// Heal tiers are given but not one per level.
    #[error("expected {expected} heal tiers, found {found}")]
    HealTiers {
        /// Tiers required.
        expected: usize,
        /// Tiers given.
        found: usize,
    },
}
