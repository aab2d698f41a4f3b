//! Named stat modifiers applied during battle.

use warhost_rules::{EffectFlags, EffectId, Ruleset};

use super::Soldier;

impl Soldier {
    /// True if the soldier is under `effect`.
    #[must_use]
    pub fn has_effect(&self, effect: EffectId) -> bool {
        self.effects.get(effect.index()).copied().unwrap_or(false)
    }

    /// Applies an effect's modifiers.
    ///
    /// The effect it cancels is cleared first. NOSET effects change stats
    /// without marking the soldier.
    pub fn set_effect(&mut self, rules: &Ruleset, effect: EffectId) {
        let def = rules.effect(effect);
        if let Some(cancel) = def.cancel.as_deref().and_then(|c| rules.find_effect(c)) {
            self.clear_effect(rules, cancel);
        }
        self.attack_skill += def.attack;
        for m in &def.defense {
            self.defense[m.attack_type.index()] += m.value;
        }
        if !def.flags.contains(EffectFlags::NOSET) {
            if let Some(slot) = self.effects.get_mut(effect.index()) {
                *slot = true;
            }
        }
    }

    /// Removes an effect and its modifiers. Does nothing if the soldier is
    /// not under it.
    pub fn clear_effect(&mut self, rules: &Ruleset, effect: EffectId) {
        if !self.has_effect(effect) {
            return;
        }
        let def = rules.effect(effect);
        self.attack_skill -= def.attack;
        for m in &def.defense {
            self.defense[m.attack_type.index()] -= m.value;
        }
        self.effects[effect.index()] = false;
    }

    /// Clears every ONESHOT effect; called when the soldier ends its turn.
    pub fn clear_one_time_effects(&mut self, rules: &Ruleset) {
        for effect in rules.effect_ids() {
            if rules.effect(effect).flags.contains(EffectFlags::ONESHOT) {
                self.clear_effect(rules, effect);
            }
        }
    }
}
