//! Battle configuration globals.
//!
//! These are the ruleset switches that change how battles play out. Every
//! field has a default so a ruleset file only needs to name what it changes.

use serde::{Deserialize, Serialize};

/// How an army decides it has broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutMode {
    /// Broken when fewer than half the soldiers are alive.
    #[default]
    Figures,
    /// Broken when fewer than half the hits remain; a soldier's hits leave
    /// the pool only when it dies.
    HitsFigure,
    /// Broken when fewer than half the hits remain; every hit counts.
    HitsIndividual,
}

impl RoutMode {
    /// Hits-based modes break on hit totals rather than head counts.
    #[must_use]
    pub fn counts_hits(self) -> bool {
        !matches!(self, Self::Figures)
    }
}

/// Whether battle items must be readied before they are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepareMode {
    /// Every carried battle item may be used.
    #[default]
    None,
    /// A readied item is used; without one, anything may be used.
    Normal,
    /// Only the readied item may be used.
    Strict,
}

fn default_max_rounds() -> u32 {
    100
}

fn default_max_assassin_attacks() -> i32 {
    -1
}

fn default_heals_per_man() -> i32 {
    1
}

fn default_potion_charges() -> i32 {
    1
}

/// Global battle switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// How armies break.
    pub rout_mode: RoutMode,
    /// Building bonuses go into a separate protection array and slow
    /// attackers instead of adding to defense.
    pub advanced_forts: bool,
    /// Monsters regenerate hits during battle.
    pub monster_battle_regen: bool,
    /// Tactics only improves in battle once the skill is near its cap.
    pub tactics_needs_war: bool,
    /// Battle item preparation rule.
    pub prepare: PrepareMode,
    /// Weapon attacks an assassin may make; negative means no cap.
    #[serde(default = "default_max_assassin_attacks")]
    pub max_assassin_free_attacks: i32,
    /// Percent chance that a man killed by an undead rises as undead.
    pub undeath_contagion: i32,
    /// Non-zero makes roaming monsters carry less loot the longer they
    /// have been free.
    pub monster_no_spoils: i32,
    /// Months of freedom after which a monster carries no loot at all.
    pub monster_spoils_recovery: i32,
    /// Monster loot of the normal category never falls back to trade goods.
    pub spoils_no_trade: bool,
    /// Patients one level of the healing skill can treat with herbs.
    #[serde(default = "default_heals_per_man")]
    pub heals_per_man: i32,
    /// Patients one healing potion can treat.
    #[serde(default = "default_potion_charges")]
    pub healing_potion_charges: i32,
    /// Hard cap on normal rounds.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            rout_mode: RoutMode::Figures,
            advanced_forts: false,
            monster_battle_regen: false,
            tactics_needs_war: false,
            prepare: PrepareMode::None,
            max_assassin_free_attacks: default_max_assassin_attacks(),
            undeath_contagion: 0,
            monster_no_spoils: 0,
            monster_spoils_recovery: 0,
            spoils_no_trade: false,
            heals_per_man: default_heals_per_man(),
            healing_potion_charges: default_potion_charges(),
            max_rounds: default_max_rounds(),
        }
    }
}

/// One healing tier: how many patients a healer treats and the percent
/// chance each treatment succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealTier {
    /// Patients per healer.
    pub count: i32,
    /// Success chance in percent.
    pub rate: i32,
}

/// Items and skills with a fixed role in battle.
///
/// Each entry names an item or skill abbreviation. A missing entry turns the
/// dependent feature off.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Designated {
    /// Silver, dropped by monsters.
    pub silver: Option<String>,
    /// Herbs consumed by mundane healers.
    pub herbs: Option<String>,
    /// Healing potion.
    pub healing_potion: Option<String>,
    /// Amulet of invulnerability.
    pub amulet: Option<String>,
    /// Ring of invisibility. An assassin wearing one leaves the victim's
    /// amulet of true seeing behind.
    pub ring: Option<String>,
    /// Amulet of true seeing, the counter to the ring of invisibility.
    pub true_seeing: Option<String>,
    /// Item minted for men who rise as undead.
    pub raised_undead: Option<String>,
    /// Unarmed combat skill.
    pub combat_skill: Option<String>,
    /// Tactics skill.
    pub tactics_skill: Option<String>,
    /// Mundane healing skill.
    pub healing_skill: Option<String>,
    /// Magical healing skill.
    pub magical_healing_skill: Option<String>,
}
