//! Rounds of attacks between two armies.
//!
//! A soldier's turn goes: special ability, mount special, weapon swings.
//! Every swing and every damage line of a special is one
//! [`Army::do_an_attack`] against the other side.

use tracing::{debug, trace};
use warhost_rules::{ItemKind, Ruleset, SpecialFlags, SpecialType, WeaponClass, WeaponFlags};

use super::BattleLog;
use crate::army::{Army, Attack, Strike};
use crate::rng::RandomSource;

/// The state every attack in a battle shares.
pub(super) struct Fight<'a> {
    pub(super) rules: &'a Ruleset,
    pub(super) rng: &'a mut dyn RandomSource,
    pub(super) log: &'a mut BattleLog,
}

/// Draws a uniform index below `n`.
fn roll_index(rng: &mut dyn RandomSource, n: usize) -> usize {
    let n = i32::try_from(n).unwrap_or(i32::MAX);
    usize::try_from(rng.roll(n)).unwrap_or(0)
}

/// Joins narration parts as `"a, b and c"`.
fn join_and(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

impl Fight<'_> {
    // =========================================================================
    // Rounds
    // =========================================================================

    /// A round in which only `att` acts.
    ///
    /// # Arguments
    ///
    /// * `att` - The side attacking
    /// * `def` - The side taking the attacks
    /// * `assassination` - Caps weapon attacks at the assassin limit
    pub(super) fn free_round(&mut self, att: &mut Army, def: &mut Army, assassination: bool) {
        self.log.add(format!("{} gets a free round of attacks.", att.leader));
        att.update_shields(self.rules, self.log);
        def.update_shields(self.rules, self.log);
        att.round += 1;

        let alive = def.num_alive();
        while att.can_attack() > 0 && def.num_alive() > 0 {
            let num = roll_index(self.rng, att.can_attack());
            let slot = att.get_attacker(num);
            self.do_attack(att, slot, def, assassination);
        }

        def.regenerate(self.rules, self.log);
        self.log
            .add(format!("{} loses {}.", def.leader, alive - def.num_alive()));
        self.log.add("");
        att.reset();
    }

    /// A round in which both sides act, the next actor drawn from the
    /// combined pool of both armies.
    pub(super) fn normal_round(&mut self, round: u32, a: &mut Army, b: &mut Army) {
        self.log.add(format!("Round {round}:"));
        a.update_shields(self.rules, self.log);
        b.update_shields(self.rules, self.log);
        a.round += 1;
        b.round += 1;

        let (a_alive, b_alive) = (a.num_alive(), b.num_alive());
        loop {
            let (aatt, batt) = (a.can_attack(), b.can_attack());
            if a.num_alive() == 0 || b.num_alive() == 0 || aatt + batt == 0 {
                break;
            }
            let num = roll_index(self.rng, aatt + batt);
            if num >= aatt {
                let slot = b.get_attacker(num - aatt);
                self.do_attack(b, slot, a, false);
            } else {
                let slot = a.get_attacker(num);
                self.do_attack(a, slot, b, false);
            }
        }

        a.regenerate(self.rules, self.log);
        b.regenerate(self.rules, self.log);
        self.log
            .add(format!("{} loses {}.", a.leader, a_alive - a.num_alive()));
        self.log
            .add(format!("{} loses {}.", b.leader, b_alive - b.num_alive()));
        self.log.add("");
        a.reset();
        b.reset();
        debug!(
            round,
            attackers = a.num_alive(),
            defenders = b.num_alive(),
            "round over"
        );
    }

    // =========================================================================
    // A soldier's turn
    // =========================================================================

    /// Resolves one soldier's turn.
    ///
    /// `slot` is the soldier's position in `atts` and whether it fights
    /// from the behind rank, as returned by [`Army::get_attacker`].
    pub(super) fn do_attack(
        &mut self,
        atts: &mut Army,
        slot: (usize, bool),
        defs: &mut Army,
        assassination: bool,
    ) {
        let (index, behind) = slot;
        self.take_turn(atts, index, behind, defs, assassination);
        atts.soldier_mut(index).clear_one_time_effects(self.rules);
    }

    fn take_turn(
        &mut self,
        atts: &Army,
        index: usize,
        behind: bool,
        defs: &mut Army,
        assassination: bool,
    ) {
        let rules = self.rules;
        let s = atts.soldier(index);
        let undead = rules.item(s.race).kind.contains(ItemKind::UNDEAD);

        if let Some(sp) = s.special.map(|id| rules.special(id)) {
            if sp.flags.contains(SpecialFlags::DAMAGE) {
                self.cast(&s.name, sp, s.special_level, undead, defs);
            }
        }
        if defs.num_alive() == 0 {
            return;
        }

        if !behind {
            let mount = s.riding.and_then(|m| rules.mount(m));
            if let Some(mount) = mount {
                let special = mount
                    .special
                    .as_deref()
                    .and_then(|key| rules.find_special(key));
                if let Some(sp) = special.map(|id| rules.special(id)) {
                    let (total, _) = self.fire(sp, mount.special_level, undead, defs);
                    if let Some(total) = total {
                        self.log.add(format!(
                            "{} {}, {}{total}{}.",
                            s.name, sp.spell_desc, sp.spell_desc2, sp.spell_target
                        ));
                    }
                }
            }
        }
        if defs.num_alive() == 0 {
            return;
        }

        let mut swings = s.attacks;
        if swings < 0 {
            let every = swings.unsigned_abs();
            swings = i32::from(every == 1 || atts.round % every == 1);
        } else if assassination {
            let cap = rules.config().max_assassin_free_attacks;
            if cap > 0 {
                swings = swings.min(cap);
            }
        }

        let weapon = s.weapon.and_then(|w| rules.weapon(w));
        if behind && !weapon.is_some_and(|w| w.flags.contains(WeaponFlags::RANGED)) {
            return;
        }
        let attack = Attack {
            special: None,
            count: 1,
            attack_type: Some(s.attack_type),
            level: s.attack_skill,
            flags: weapon.map_or(WeaponFlags::empty(), |w| w.flags),
            class: weapon.map_or(WeaponClass::Slashing, |w| w.class),
            strike: Strike::Kill,
            mount_bonus: weapon.map_or(0, |w| w.mount_bonus),
            undead,
        };
        for _ in 0..swings {
            defs.do_an_attack(rules, self.rng, &attack);
            if defs.num_alive() == 0 {
                break;
            }
        }
    }

    // =========================================================================
    // Specials
    // =========================================================================

    /// Fires a soldier's special ability and narrates it.
    fn cast(&mut self, name: &str, sp: &SpecialType, level: i32, undead: bool, defs: &mut Army) {
        let (total, parts) = self.fire(sp, level, undead, defs);
        trace!(special = %sp.key, level, landed = ?total, "special fired");
        let line = match total {
            None => format!("{name} {}, but it is deflected.", sp.spell_desc),
            Some(_) if sp.flags.contains(SpecialFlags::DONT_COMBINE) => format!(
                "{name} {}, {}{}.",
                sp.spell_desc,
                join_and(&parts),
                sp.spell_target
            ),
            Some(total) => format!(
                "{name} {}, {}{total}{}.",
                sp.spell_desc, sp.spell_desc2, sp.spell_target
            ),
        };
        self.log.add(line);
    }

    /// Resolves every damage line of `sp` at `level`.
    ///
    /// Returns the number of attacks that landed, `None` if shields stopped
    /// every line, along with one tally per line that got through.
    fn fire(
        &mut self,
        sp: &SpecialType,
        level: i32,
        undead: bool,
        defs: &mut Army,
    ) -> (Option<i32>, Vec<String>) {
        let rules = self.rules;
        let mut total = None;
        let mut parts = Vec::new();

        for entry in &sp.damage {
            let times = if sp.flags.contains(SpecialFlags::USE_LEVEL) {
                entry.value * level
            } else {
                entry.value
            };
            let count = entry.min + self.rng.roll(times) + self.rng.roll(times);
            let strike = match entry.effect.as_deref() {
                Some(effect) => {
                    let id = rules.find_effect(effect);
                    if id.is_none() {
                        debug!(special = %sp.key, effect, "effect not in ruleset");
                    }
                    Strike::Effect(id)
                }
                None => Strike::Kill,
            };
            let attack = Attack {
                special: Some(sp),
                count,
                attack_type: entry.attack_type,
                level,
                flags: entry.flags,
                class: entry.class,
                strike,
                mount_bonus: 0,
                undead,
            };

            let Some(landed) = defs.do_an_attack(rules, self.rng, &attack) else {
                continue;
            };
            *total.get_or_insert(0) += landed;
            parts.push(if entry.effect.is_some() {
                format!("{}{landed}", sp.spell_desc2)
            } else {
                format!("killing {landed}")
            });
        }
        (total, parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{rules, rules_with, soldiers, ScriptedRng};
    use warhost_rules::{AttackType, DamageEntry, ShieldCoverage};

    fn side(rules: &Ruleset, leader: &str, front: usize, behind: usize) -> Army {
        Army::from_ranks(
            leader.to_string(),
            soldiers(rules, "MAN", front),
            soldiers(rules, "MAN", behind),
        )
    }

    fn run<T>(rules: &Ruleset, script: &[i32], f: impl FnOnce(&mut Fight<'_>) -> T) -> (T, BattleLog, usize) {
        let mut rng = ScriptedRng::new(script.to_vec());
        let mut log = BattleLog::new();
        let out = {
            let mut fight = Fight {
                rules,
                rng: &mut rng,
                log: &mut log,
            };
            f(&mut fight)
        };
        (out, log, rng.draws())
    }

    #[test]
    fn join_reads_naturally() {
        let parts = |xs: &[&str]| xs.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(join_and(&parts(&[])), "");
        assert_eq!(join_and(&parts(&["killing 2"])), "killing 2");
        assert_eq!(join_and(&parts(&["a", "b", "c"])), "a, b and c");
    }

    mod weapons {
        use super::*;

        #[test]
        fn swing_kills() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            let mut b = side(&rules, "Blue (2)", 1, 0);

            // Target, ready, hit.
            let (_, log, draws) = run(&rules, &[0, 0, 0], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 0);
            assert_eq!(draws, 3);
            assert!(log.is_empty());
        }

        #[test]
        fn behind_rank_needs_ranged_weapon() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 1);
            let mut b = side(&rules, "Blue (2)", 1, 0);

            let (_, _, draws) = run(&rules, &[], |f| {
                let slot = a.get_attacker(1);
                assert!(slot.1);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(draws, 0);
            assert_eq!(b.num_alive(), 1);
        }

        #[test]
        fn crossbow_fires_from_behind() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 1);
            {
                let s = a.soldier_mut(1);
                s.weapon = rules.find_item("XBOW");
                s.attack_type = AttackType::Ranged;
                s.attacks = 1;
            }
            let mut b = side(&rules, "Blue (2)", 1, 0);

            run(&rules, &[0, 0, 0], |f| {
                let slot = a.get_attacker(1);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 0);
        }

        #[test]
        fn slow_weapons_skip_rounds() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).attacks = -2;
            let mut b = side(&rules, "Blue (2)", 1, 0);

            a.round = 2;
            let (_, _, idle) = run(&rules, &[], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(idle, 0);

            a.reset();
            a.round = 3;
            let (_, _, active) = run(&rules, &[0, 1], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(active, 2, "one swing, too slow to land");
        }

        #[test]
        fn assassins_are_capped() {
            let rules = rules_with(|d| d.config.max_assassin_free_attacks = 1);
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).attacks = 3;
            let mut b = side(&rules, "Blue (2)", 1, 0);

            // One swing: target, then too slow.
            let (_, _, draws) = run(&rules, &[0, 1], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, true);
            });
            assert_eq!(draws, 2);
        }

        #[test]
        fn one_shot_effects_end_with_the_turn() {
            let rules = rules();
            let dazzle = rules.find_effect("dazzle").unwrap();
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).attacks = 0;
            a.soldier_mut(0).set_effect(&rules, dazzle);
            let before = a.soldier(0).attack_skill;
            let mut b = side(&rules, "Blue (2)", 1, 0);

            run(&rules, &[], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            let s = a.soldier(0);
            assert!(!s.has_effect(dazzle));
            assert_eq!(s.attack_skill, before + 1);
        }
    }

    mod specials {
        use super::*;

        #[test]
        fn fireball_is_narrated_with_its_tally() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).special = rules.find_special("fireball");
            a.soldier_mut(0).special_level = 1;
            let mut b = side(&rules, "Blue (2)", 3, 0);

            // Count 2 + 0 + 0; two kills at three draws each; the sword-less
            // swing is too slow.
            let script = [0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
            let (_, log, draws) = run(&rules, &script, |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 1);
            assert_eq!(log.lines(), ["Test (1) shoots a Fireball, killing 2."]);
            assert_eq!(draws, script.len());
        }

        #[test]
        fn shielded_special_is_deflected() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).special = rules.find_special("lightning");
            a.soldier_mut(0).special_level = 1;
            let mut b = side(&rules, "Blue (2)", 1, 0);
            b.shields.add(ShieldCoverage::Only(AttackType::Energy), 5);

            // Count 1; Hits(1, 5) draw 5 fails; then the swing misses.
            let (_, log, _) = run(&rules, &[0, 0, 5, 0, 1], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 1);
            assert_eq!(b.shields.len(), 1);
            assert_eq!(
                log.lines(),
                ["Test (1) casts Lightning Bolt, but it is deflected."]
            );
        }

        #[test]
        fn uncombined_lines_are_listed() {
            let rules = rules_with(|d| {
                let sp = d.specials.iter_mut().find(|s| s.key == "terrify").unwrap();
                sp.flags |= SpecialFlags::DONT_COMBINE;
                sp.target_flags = warhost_rules::TargetFlags::empty();
                sp.damage.push(DamageEntry {
                    attack_type: None,
                    min: 1,
                    value: 0,
                    flags: WeaponFlags::ALWAYSREADY,
                    class: WeaponClass::MagicSpirit,
                    effect: None,
                });
            });
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).special = rules.find_special("terrify");
            a.soldier_mut(0).special_level = 1;
            a.soldier_mut(0).attacks = 0;
            let mut b = side(&rules, "Blue (2)", 3, 0);

            // Fear: count 1 + 0 + 0, target, ready, hit. Kill: count 1,
            // target only since it cannot be defended.
            let (_, log, _) = run(&rules, &[0, 0, 0, 0, 0, 2], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 2);
            assert_eq!(
                log.lines(),
                ["Test (1) is surrounded by an Aura of Fear, terrifying 1 and killing 1 men."]
            );
        }

        #[test]
        fn mount_special_tramples_from_the_front() {
            let rules = rules_with(|d| {
                let horse = d.mounts.iter_mut().find(|m| m.item == "HORS").unwrap();
                horse.special = Some("lightning".to_string());
                horse.special_level = 2;
            });
            let mut a = side(&rules, "Red (1)", 1, 0);
            a.soldier_mut(0).riding = rules.find_item("HORS");
            a.soldier_mut(0).attacks = 0;
            let mut b = side(&rules, "Blue (2)", 2, 0);

            // Count 1 + 0 + 0, then target, ready, hit.
            let (_, log, _) = run(&rules, &[0, 0, 0, 0, 0], |f| {
                let slot = a.get_attacker(0);
                f.do_attack(&mut a, slot, &mut b, false);
            });
            assert_eq!(b.num_alive(), 1);
            assert_eq!(log.lines(), ["Test (1) casts Lightning Bolt, killing 1."]);
        }
    }

    mod rounds {
        use super::*;

        #[test]
        fn free_round_only_one_side_acts() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            let mut b = side(&rules, "Blue (2)", 1, 0);

            // Pick the only attacker, then target, ready, hit.
            let (_, log, _) = run(&rules, &[0, 0, 0, 0], |f| {
                f.free_round(&mut a, &mut b, false);
            });
            assert_eq!(a.round, 1);
            assert_eq!(b.round, 0);
            assert_eq!(a.can_attack(), 1, "reset for the next round");
            assert_eq!(
                log.lines(),
                ["Red (1) gets a free round of attacks.", "Blue (2) loses 1.", ""]
            );
        }

        #[test]
        fn normal_round_draws_from_both_pools() {
            let rules = rules();
            let mut a = side(&rules, "Red (1)", 1, 0);
            let mut b = side(&rules, "Blue (2)", 1, 0);

            // Red acts first and is too slow; Blue is the only one left and
            // kills Red.
            let script = [0, 0, 1, 0, 0, 0, 0];
            let (_, log, draws) = run(&rules, &script, |f| {
                f.normal_round(1, &mut a, &mut b);
            });
            assert_eq!(draws, script.len());
            assert_eq!(a.num_alive(), 0);
            assert_eq!((a.round, b.round), (1, 1));
            assert_eq!(
                log.lines(),
                ["Round 1:", "Red (1) loses 1.", "Blue (2) loses 0.", ""]
            );
        }
    }
}
