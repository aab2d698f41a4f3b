//! Test helper functions for rulesets, units, worlds and scripted draws.
//!
//! The sample ruleset in `data/sample_rules.json` carries every item, skill
//! and special the tests refer to by abbreviation.

use std::collections::VecDeque;

use warhost_rules::{Ruleset, RulesetDef, TerrainFlags, TerrainId, TerrainType};

use crate::engagement::Engagement;
use crate::rng::RandomSource;
use crate::soldier::Soldier;
use crate::world::{Faction, FactionId, Location, Region, Unit, UnitId, World};

/// The sample ruleset shipped with the crate.
pub const SAMPLE_RULES: &str = include_str!("../../data/sample_rules.json");

/// Routes engine events to the test harness output.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Rulesets
// =============================================================================

/// Loads the sample ruleset.
///
/// # Panics
///
/// Panics if the sample ruleset fails to load.
#[must_use]
pub fn rules() -> Ruleset {
    rules_with(|_| {})
}

/// Loads the sample ruleset after applying `tweak` to its definition.
///
/// # Panics
///
/// Panics if the tweaked ruleset fails validation.
pub fn rules_with(tweak: impl FnOnce(&mut RulesetDef)) -> Ruleset {
    let mut def: RulesetDef = serde_json::from_str(SAMPLE_RULES).expect("sample ruleset parses");
    tweak(&mut def);
    Ruleset::from_def(def).expect("sample ruleset validates")
}

/// Open plains where horses can be ridden.
#[must_use]
pub fn plain() -> TerrainType {
    TerrainType {
        name: "plain".to_string(),
        flags: TerrainFlags::RIDINGMOUNTS,
    }
}

// =============================================================================
// Units and soldiers
// =============================================================================

/// A normal unit named "Test" of faction 1 holding the given items.
///
/// # Panics
///
/// Panics on an abbreviation the ruleset does not know.
#[must_use]
pub fn unit_with(rules: &Ruleset, id: u32, items: &[(&str, u32)]) -> Unit {
    let mut unit = Unit::new(UnitId::new(id), "Test", FactionId::new(1));
    for &(abbr, n) in items {
        let item = rules
            .find_item(abbr)
            .unwrap_or_else(|| panic!("unknown item {abbr}"));
        unit.items.add(item, n);
    }
    unit
}

/// `n` soldiers of `race` from unit 1, in open plains.
#[must_use]
pub fn soldiers(rules: &Ruleset, race: &str, n: usize) -> Vec<Soldier> {
    let count = u32::try_from(n).expect("small count");
    let mut unit = unit_with(rules, 1, &[(race, count)]);
    let race = rules.find_item(race).expect("known race");
    (0..n)
        .map(|_| Soldier::new(rules, &mut unit, None, &plain(), race, false))
        .collect()
}

// =============================================================================
// Worlds and engagements
// =============================================================================

/// A world with two unallied factions: Red (1) and Blue (2).
#[must_use]
pub fn two_factions() -> World {
    let mut world = World::new();
    world.insert_faction(Faction::new(FactionId::new(1), "Red"));
    world.insert_faction(Faction::new(FactionId::new(2), "Blue"));
    world
}

/// A unit of `faction` with the given name and items, added to `world`.
pub fn add_unit(
    world: &mut World,
    rules: &Ruleset,
    id: u32,
    name: &str,
    faction: u32,
    items: &[(&str, u32)],
) -> UnitId {
    let mut unit = unit_with(rules, id, items);
    unit.name = name.to_string();
    unit.faction = FactionId::new(faction);
    world.insert_unit(unit);
    UnitId::new(id)
}

/// The plain region the scenarios are fought in.
///
/// # Panics
///
/// Panics if the ruleset has no `plain` terrain.
#[must_use]
pub fn region(rules: &Ruleset) -> Region {
    let terrain: TerrainId = rules.find_terrain("plain").expect("plain terrain");
    Region {
        name: "plain (1,1) in Testia".to_string(),
        terrain,
        safe: false,
    }
}

/// An attack by `attacker` on `target`, each side fighting alone in the
/// open.
#[must_use]
pub fn duel(attacker: UnitId, target: UnitId) -> Engagement {
    Engagement {
        attacker,
        target,
        attackers: vec![Location::open(attacker)],
        defenders: vec![Location::open(target)],
        assassination: false,
    }
}

/// Gives a unit a skill level.
///
/// # Panics
///
/// Panics on a skill the ruleset does not know.
pub fn teach(world: &mut World, rules: &Ruleset, unit: UnitId, skill: &str, level: i32) {
    let skill = rules
        .find_skill(skill)
        .unwrap_or_else(|| panic!("unknown skill {skill}"));
    if let Some(u) = world.unit_mut(unit) {
        u.skills.insert(skill, level);
    }
}

/// A mixed battle: swordsmen and crossbowmen fighting from behind against
/// spearmen, riders and a fire mage.
#[must_use]
pub fn skirmish(rules: &Ruleset) -> (World, Engagement) {
    let mut world = two_factions();
    let guard = add_unit(&mut world, rules, 10, "Red Guard", 1, &[("MAN", 8), ("SWOR", 8), ("PARM", 4)]);
    let bows = add_unit(&mut world, rules, 11, "Red Bows", 1, &[("MAN", 4), ("XBOW", 4)]);
    teach(&mut world, rules, guard, "COMB", 2);
    teach(&mut world, rules, guard, "TACT", 1);
    teach(&mut world, rules, bows, "XBOW", 2);
    if let Some(u) = world.unit_mut(bows) {
        u.flags |= crate::world::UnitFlags::BEHIND;
    }

    let host = add_unit(
        &mut world,
        rules,
        20,
        "Blue Host",
        2,
        &[("MAN", 10), ("SPEA", 6), ("HORS", 3), ("CLAR", 10), ("SILV", 120), ("WINE", 6)],
    );
    teach(&mut world, rules, host, "COMB", 1);
    teach(&mut world, rules, host, "RIDI", 2);
    let mage = add_unit(&mut world, rules, 21, "Blue Mage", 2, &[("LEAD", 1)]);
    teach(&mut world, rules, mage, "FIRE", 2);
    if let Some(u) = world.unit_mut(mage) {
        u.kind = crate::world::UnitKind::Mage;
        u.combat_spell = rules.find_skill("FIRE");
        u.flags |= crate::world::UnitFlags::BEHIND;
    }

    let engagement = Engagement {
        attacker: guard,
        target: host,
        attackers: vec![Location::open(guard), Location::open(bows)],
        defenders: vec![Location::open(host), Location::open(mage)],
        assassination: false,
    };
    (world, engagement)
}

// =============================================================================
// Scripted randomness
// =============================================================================

/// A [`RandomSource`] that replays a fixed list of draws.
///
/// Draws with `n <= 0` return 0 without consuming anything, like the real
/// source.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    script: VecDeque<i32>,
    draws: usize,
}

impl ScriptedRng {
    /// Creates a source that returns `script` in order.
    pub fn new(script: impl IntoIterator<Item = i32>) -> Self {
        Self {
            script: script.into_iter().collect(),
            draws: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRng {
    fn roll(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.draws += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| panic!("script exhausted at draw {} (roll {n})", self.draws))
    }
}
