//! Resolving attacks against an army.

use tracing::trace;
use warhost_rules::{
    AttackType, EffectId, ItemKind, Ruleset, SpecialFlags, SpecialType, WeaponClass, WeaponFlags,
};

use super::Army;
use crate::rng::{hits, RandomSource};

/// What a landed attack does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// One hit, unless armor saves it.
    Kill,
    /// Applies an effect. `None` names an effect the ruleset does not
    /// define; such attacks land without doing anything.
    Effect(Option<EffectId>),
}

/// One batch of identical attacks against an army.
#[derive(Debug, Clone, Copy)]
pub struct Attack<'a> {
    /// Special ability behind the attack; its target filters apply.
    pub special: Option<&'a SpecialType>,
    /// Number of attacks.
    pub count: i32,
    /// Attack type defended against; `None` cannot be defended or shielded.
    pub attack_type: Option<AttackType>,
    /// Attack skill.
    pub level: i32,
    /// Weapon behaviour bits.
    pub flags: WeaponFlags,
    /// Damage class for armor saves.
    pub class: WeaponClass,
    /// What a landed attack does.
    pub strike: Strike,
    /// Bonus against mounted targets.
    pub mount_bonus: i32,
    /// The attacker is undead and may raise its kills.
    pub undead: bool,
}

impl Army {
    /// Resolves a batch of attacks against this army.
    ///
    /// The strongest matching shield is tried first; if it holds, nothing
    /// happens and `None` is returned. A magical attack that gets through
    /// tears the shield down. Otherwise each attack picks its own target
    /// and returns the number that landed.
    pub fn do_an_attack(
        &mut self,
        rules: &Ruleset,
        rng: &mut dyn RandomSource,
        attack: &Attack<'_>,
    ) -> Option<i32> {
        if let Some(t) = attack.attack_type.filter(|t| t.is_shieldable()) {
            if let Some((index, level)) = self.shields.highest(t) {
                if !hits(rng, attack.level, level) {
                    trace!(attack_type = ?t, shield = level, "attack deflected");
                    return None;
                }
                if t.is_magical() {
                    trace!(attack_type = ?t, shield = level, "shield torn down");
                    self.shields.remove(index);
                }
            }
        }

        let nobuilding = attack
            .special
            .is_some_and(|sp| sp.flags.contains(SpecialFlags::NOBUILDING));
        let contagion = rules.config().undeath_contagion;
        let mut landed = 0;

        for _ in 0..attack.count {
            let Some(target) = self.get_target_num(rules, attack.special, rng) else {
                continue;
            };
            let tar = &self.soldiers[target];

            let mut defense = attack.attack_type.map_or(0, |t| tar.defense_against(t));
            if nobuilding && tar.building.is_some() {
                defense -= 2;
            }
            if attack.flags.contains(WeaponFlags::NODEFENSE) && defense > 0 {
                defense = 0;
            }

            let mut level = attack.level;
            if !attack.flags.contains(WeaponFlags::RANGED) {
                let tar_flags = tar
                    .weapon
                    .and_then(|w| rules.weapon(w))
                    .map_or(WeaponFlags::empty(), |w| w.flags);
                let ours = weapon_length(attack.flags);
                let theirs = weapon_length(tar_flags);
                if ours > theirs {
                    level += 1;
                } else if theirs > ours {
                    defense += 1;
                }
            }
            if tar.riding.is_some() {
                level += attack.mount_bonus;
            }

            if let Some(t) = attack.attack_type {
                if !attack.flags.contains(WeaponFlags::ALWAYSREADY) {
                    let protection = if rules.config().advanced_forts {
                        tar.protection[t.index()]
                    } else {
                        0
                    };
                    if rng.roll(2 + protection) != 0 {
                        continue;
                    }
                }
                if !hits(rng, level, defense) {
                    continue;
                }
            }

            match attack.strike {
                Strike::Effect(effect) => {
                    let Some(effect) = effect else {
                        continue;
                    };
                    if tar.has_effect(effect) {
                        continue;
                    }
                    self.soldiers[target].set_effect(rules, effect);
                    landed += 1;
                }
                Strike::Kill => {
                    if tar.armor_protect(rules, attack.class, rng) {
                        continue;
                    }
                    landed += 1;
                    let is_man = rules.item(tar.race).kind.contains(ItemKind::MAN);
                    let alive_before = self.num_alive();
                    self.kill(target, rules);
                    if self.num_alive() < alive_before && is_man && attack.undead {
                        if rng.roll(100) < contagion {
                            // The body now sits at the first dead slot.
                            let body = self.num_alive();
                            self.soldiers[body].can_be_healed = false;
                            self.raised += 1;
                        }
                    }
                }
            }
        }
        Some(landed)
    }
}

/// Reach of a weapon: long 2, short 0, otherwise 1.
fn weapon_length(flags: WeaponFlags) -> i32 {
    if flags.contains(WeaponFlags::LONG) {
        2
    } else if flags.contains(WeaponFlags::SHORT) {
        0
    } else {
        1
    }
}
