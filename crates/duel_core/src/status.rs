//! Timed status effects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, timed condition attached to a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Loses 5% of max HP at the start of each own turn.
    Burn,
    /// Loses 10% of max HP at the start of each own turn.
    Poison,
    /// Cannot act; the turn is consumed.
    Stun,
    /// Tracked and displayed; carries no mechanical effect.
    Freeze,
    /// Marker for a raised guard from the defend action.
    Defending,
}

impl StatusEffect {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StatusEffect::Burn => "Burn",
            StatusEffect::Poison => "Poison",
            StatusEffect::Stun => "Stun",
            StatusEffect::Freeze => "Freeze",
            StatusEffect::Defending => "Defending",
        }
    }

    /// HP lost at the start of the afflicted participant's turn.
    #[must_use]
    pub const fn start_of_turn_damage(self, max_hp: u32) -> u32 {
        match self {
            StatusEffect::Burn => max_hp / 20,
            StatusEffect::Poison => max_hp / 10,
            StatusEffect::Stun | StatusEffect::Freeze | StatusEffect::Defending => 0,
        }
    }
}

impl fmt::Display for StatusEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Active effects and their remaining turn counts.
///
/// Counts are always strictly positive; an effect whose count reaches zero
/// is removed. Iteration order is the enum order, which keeps logs stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffects {
    active: BTreeMap<StatusEffect, u32>,
}

impl StatusEffects {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply (or refresh) an effect for `turns` turns. Zero turns removes it.
    pub fn apply(&mut self, effect: StatusEffect, turns: u32) {
        if turns == 0 {
            self.active.remove(&effect);
        } else {
            self.active.insert(effect, turns);
        }
    }

    /// Remove an effect regardless of its remaining turns.
    pub fn clear(&mut self, effect: StatusEffect) -> bool {
        self.active.remove(&effect).is_some()
    }

    /// Whether the effect is active.
    #[must_use]
    pub fn has(&self, effect: StatusEffect) -> bool {
        self.active.contains_key(&effect)
    }

    /// Remaining turns for an effect, if active.
    #[must_use]
    pub fn remaining(&self, effect: StatusEffect) -> Option<u32> {
        self.active.get(&effect).copied()
    }

    /// Decrement every counter by one, returning the effects that expired.
    pub fn tick(&mut self) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        self.active.retain(|effect, turns| {
            *turns = turns.saturating_sub(1);
            if *turns == 0 {
                expired.push(*effect);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Iterate active effects with their remaining turns.
    pub fn iter(&self) -> impl Iterator<Item = (StatusEffect, u32)> + '_ {
        self.active.iter().map(|(effect, turns)| (*effect, *turns))
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
