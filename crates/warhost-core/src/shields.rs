//! Per-army magical shields.
//!
//! Shields are rebuilt from scratch at the start of every round from the
//! specials of the army's living soldiers. An incoming shieldable attack
//! must beat the strongest matching shield before any target is chosen.

use serde::{Deserialize, Serialize};
use warhost_rules::{AttackType, ShieldCoverage};

/// One raised shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    /// Attack types blocked.
    pub coverage: ShieldCoverage,
    /// Skill an attack must beat.
    pub level: i32,
}

/// The shields an army has up this round, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldList {
    shields: Vec<Shield>,
}

impl ShieldList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every shield.
    pub fn clear(&mut self) {
        self.shields.clear();
    }

    /// Raises a shield.
    pub fn add(&mut self, coverage: ShieldCoverage, level: i32) {
        self.shields.push(Shield { coverage, level });
    }

    /// Position and level of the strongest shield against `attack_type`.
    ///
    /// Ties go to the shield raised first.
    #[must_use]
    pub fn highest(&self, attack_type: AttackType) -> Option<(usize, i32)> {
        let mut best: Option<(usize, i32)> = None;
        for (i, s) in self.shields.iter().enumerate() {
            if s.coverage.covers(attack_type) && best.map_or(true, |(_, l)| s.level > l) {
                best = Some((i, s.level));
            }
        }
        best
    }

    /// Tears down the shield at `index`.
    pub fn remove(&mut self, index: usize) {
        if index < self.shields.len() {
            self.shields.remove(index);
        }
    }

    /// Number of shields up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shields.len()
    }

    /// True when no shield is up.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shields.is_empty()
    }
}
