//! One side of a battle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::dice::Dice;
use crate::element::Element;
use crate::stats::{CharacterSheet, CombatStats};
use crate::status::{StatusEffect, StatusEffects};

/// Prefix carried by every NPC participant ID.
pub const NPC_ID_PREFIX: &str = "npc_";

static NPC_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque participant identifier (a chat user ID, or `npc_...` for bots).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh NPC identifier, unique within this process.
    #[must_use]
    pub fn next_npc() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let sequence = NPC_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{NPC_ID_PREFIX}{nanos}_{sequence}"))
    }

    /// Raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID follows the NPC naming convention.
    #[must_use]
    pub fn is_npc(&self) -> bool {
        self.0.starts_with(NPC_ID_PREFIX)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Action and target chosen for the participant's upcoming turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingAction {
    /// Chosen action.
    pub action: ActionKind,
    /// Chosen target.
    pub target: ParticipantId,
}

/// A character with combat-ready stats, mutated every turn.
///
/// HP and MP are private so that `0 <= current <= max` holds after every
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatParticipant {
    /// Identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Controlled by the NPC policy.
    pub is_npc: bool,
    current_hp: u32,
    max_hp: u32,
    current_mp: u32,
    max_mp: u32,
    /// Physical attack damage.
    pub physical_damage: u32,
    /// Magical attack damage.
    pub magical_damage: u32,
    /// Current defense, including any raised guard.
    pub defense: u32,
    /// Turn-order rating.
    pub initiative: u32,
    /// Hit chance in percent.
    pub accuracy: u32,
    dodge_chance: u32,
    /// Elemental affinity.
    pub element: Element,
    /// Active status effects.
    pub status: StatusEffects,
    guard_bonus: u32,
    pending: Option<PendingAction>,
}

impl CombatParticipant {
    /// Build a participant at full HP and MP.
    #[must_use]
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        is_npc: bool,
        stats: CombatStats,
        element: Element,
    ) -> Self {
        let stats = stats.clamped();
        Self {
            id,
            name: name.into(),
            is_npc,
            current_hp: stats.max_hp,
            max_hp: stats.max_hp,
            current_mp: stats.max_mp,
            max_mp: stats.max_mp,
            physical_damage: stats.physical_damage,
            magical_damage: stats.magical_damage,
            defense: stats.defense,
            initiative: stats.initiative,
            accuracy: stats.accuracy,
            dodge_chance: stats.dodge_chance,
            element,
            status: StatusEffects::new(),
            guard_bonus: 0,
            pending: None,
        }
    }

    /// Project a stored character into a human-controlled participant.
    #[must_use]
    pub fn from_character(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        sheet: &CharacterSheet,
    ) -> Self {
        Self::new(
            id.into(),
            name,
            false,
            CombatStats::from_sheet(sheet),
            sheet.element,
        )
    }

    /// Create an NPC of the given level with a random element.
    #[must_use]
    pub fn npc(name: impl Into<String>, level: u32, dice: &mut dyn Dice) -> Self {
        let element = Element::NPC_POOL[dice.pick(Element::NPC_POOL.len())];
        Self::new(
            ParticipantId::next_npc(),
            name,
            true,
            CombatStats::for_npc_level(level),
            element,
        )
    }

    /// Current HP.
    #[must_use]
    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    /// Maximum HP.
    #[must_use]
    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Current MP.
    #[must_use]
    pub fn current_mp(&self) -> u32 {
        self.current_mp
    }

    /// Maximum MP.
    #[must_use]
    pub fn max_mp(&self) -> u32 {
        self.max_mp
    }

    /// Dodge chance in percent.
    #[must_use]
    pub fn dodge_chance(&self) -> u32 {
        self.dodge_chance
    }

    /// Defense currently granted by a raised guard.
    #[must_use]
    pub fn guard_bonus(&self) -> u32 {
        self.guard_bonus
    }

    /// Whether HP is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Whether the participant is stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.status.has(StatusEffect::Stun)
    }

    /// Action chosen for the upcoming turn.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Choose (or overwrite) the upcoming action.
    pub fn set_pending(&mut self, action: ActionKind, target: ParticipantId) {
        self.pending = Some(PendingAction { action, target });
    }

    /// Forget the upcoming action.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Subtract HP, flooring at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    /// Add HP, capping at max. Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp - self.current_hp);
        self.current_hp += restored;
        restored
    }

    /// Drop HP to zero.
    pub fn knock_out(&mut self) {
        self.current_hp = 0;
    }

    /// Spend MP if enough is available. Leaves MP untouched otherwise.
    pub fn spend_mana(&mut self, cost: u32) -> bool {
        if self.current_mp < cost {
            return false;
        }
        self.current_mp -= cost;
        true
    }

    /// Raise the guard: +50% of current base defense until [`Self::lower_guard`].
    ///
    /// Any previous guard is lowered first, so guards never stack.
    pub fn raise_guard(&mut self) -> u32 {
        self.lower_guard();
        let bonus = self.defense / 2;
        self.defense += bonus;
        self.guard_bonus = bonus;
        self.status.apply(StatusEffect::Defending, 1);
        bonus
    }

    /// Remove any guard bonus from defense.
    pub fn lower_guard(&mut self) {
        self.defense -= self.guard_bonus.min(self.defense);
        self.guard_bonus = 0;
    }

    /// Apply start-of-turn damage from Burn and Poison.
    ///
    /// Returns each damaging effect with the HP it removed. Ticking stops
    /// at the first effect that brings HP to zero, so the last entry names
    /// the fatal effect.
    pub fn suffer_status_damage(&mut self) -> Vec<(StatusEffect, u32)> {
        let ticks: Vec<(StatusEffect, u32)> = self
            .status
            .iter()
            .map(|(effect, _)| (effect, effect.start_of_turn_damage(self.max_hp)))
            .filter(|(_, damage)| *damage > 0)
            .collect();

        let mut applied = Vec::with_capacity(ticks.len());
        for (effect, damage) in ticks {
            if !self.is_alive() {
                break;
            }
            applied.push((effect, self.take_damage(damage)));
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    fn fighter() -> CombatParticipant {
        CombatParticipant::new(
            ParticipantId::new("p1"),
            "Fighter",
            false,
            CombatStats {
                max_hp: 200,
                max_mp: 30,
                defense: 50,
                ..CombatStats::default()
            },
            Element::None,
        )
    }

    #[test]
    fn test_npc_id_convention() {
        assert!(ParticipantId::next_npc().is_npc());
        assert!(!ParticipantId::new("123456").is_npc());
        assert_ne!(ParticipantId::next_npc(), ParticipantId::next_npc());
    }

    #[test]
    fn test_hp_clamped_both_ways() {
        let mut p = fighter();
        assert_eq!(p.take_damage(500), 200);
        assert_eq!(p.current_hp(), 0);
        assert!(!p.is_alive());
        assert_eq!(p.heal(1000), 200);
        assert_eq!(p.current_hp(), 200);
    }

    #[test]
    fn test_spend_mana_rejects_overdraw() {
        let mut p = fighter();
        assert!(p.spend_mana(15));
        assert_eq!(p.current_mp(), 15);
        assert!(p.spend_mana(15));
        assert!(!p.spend_mana(15));
        assert_eq!(p.current_mp(), 0);
    }

    #[test]
    fn test_guard_does_not_stack() {
        let mut p = fighter();
        assert_eq!(p.raise_guard(), 25);
        assert_eq!(p.defense, 75);
        p.raise_guard();
        assert_eq!(p.defense, 75);
        assert!(p.status.has(StatusEffect::Defending));
        p.lower_guard();
        assert_eq!(p.defense, 50);
        assert_eq!(p.guard_bonus(), 0);
    }

    #[test]
    fn test_status_damage() {
        let mut p = fighter();
        p.status.apply(StatusEffect::Burn, 2);
        p.status.apply(StatusEffect::Poison, 2);
        p.status.apply(StatusEffect::Stun, 2);
        let ticks = p.suffer_status_damage();
        assert_eq!(
            ticks,
            vec![(StatusEffect::Burn, 10), (StatusEffect::Poison, 20)]
        );
        assert_eq!(p.current_hp(), 170);
    }

    #[test]
    fn test_status_damage_stops_at_zero_hp() {
        let mut p = fighter();
        p.take_damage(190);
        p.status.apply(StatusEffect::Burn, 2);
        p.status.apply(StatusEffect::Poison, 2);

        let ticks = p.suffer_status_damage();

        assert_eq!(ticks, vec![(StatusEffect::Burn, 10)]);
        assert_eq!(p.current_hp(), 0);
    }

    #[test]
    fn test_npc_construction() {
        let mut dice = ScriptedDice::new([0]);
        let npc = CombatParticipant::npc("Goblin", 2, &mut dice);
        assert!(npc.is_npc);
        assert!(npc.id.is_npc());
        assert_eq!(npc.element, Element::Fire);
        assert_eq!(npc.max_hp(), 600);
        assert_eq!(npc.current_hp(), 600);
    }
}
