//! Test fixtures and helpers.
//!
//! Pre-built participants and battles with round numbers so expected
//! damage can be worked out by hand.

use duel_core::battle::Battle;
use duel_core::dice::{Dice, ScriptedDice, SeededDice};
use duel_core::element::Element;
use duel_core::participant::{CombatParticipant, ParticipantId};
use duel_core::stats::CombatStats;

/// Stats used by [`fighter`]: 200 HP, 50 MP, 100 physical, 40 magical,
/// 50 defense, 70 accuracy, no dodge.
#[must_use]
pub fn standard_stats(initiative: u32) -> CombatStats {
    CombatStats {
        max_hp: 200,
        max_mp: 50,
        physical_damage: 100,
        magical_damage: 40,
        defense: 50,
        initiative,
        accuracy: 70,
        dodge_chance: 0,
    }
}

/// A human-controlled participant named after its ID (uppercased).
#[must_use]
pub fn fighter(id: &str, initiative: u32) -> CombatParticipant {
    CombatParticipant::new(
        ParticipantId::new(id),
        id.to_uppercase(),
        false,
        standard_stats(initiative),
        Element::None,
    )
}

/// A participant with explicit stats and element.
#[must_use]
pub fn custom(id: &str, stats: CombatStats, element: Element) -> CombatParticipant {
    CombatParticipant::new(
        ParticipantId::new(id),
        id.to_uppercase(),
        ParticipantId::new(id).is_npc(),
        stats,
        element,
    )
}

/// An NPC with a stable ID (`npc_<tag>`) at the given level and element.
#[must_use]
pub fn npc(tag: &str, level: u32, element: Element) -> CombatParticipant {
    CombatParticipant::new(
        ParticipantId::new(format!("npc_{tag}")),
        format!("Bot {tag}"),
        true,
        CombatStats::for_npc_level(level),
        element,
    )
}

/// Boxed scripted dice.
#[must_use]
pub fn scripted(rolls: impl IntoIterator<Item = u32>) -> Box<dyn Dice> {
    Box::new(ScriptedDice::new(rolls))
}

/// A started battle between two participants, replaying `rolls`.
///
/// # Panics
///
/// Panics if both participants share an ID.
#[must_use]
pub fn started_battle(
    a: CombatParticipant,
    b: CombatParticipant,
    rolls: impl IntoIterator<Item = u32>,
) -> Battle {
    let mut battle = Battle::new("test-channel", a, b, scripted(rolls))
        .expect("fixture participants must be distinct");
    battle.start().expect("fresh battle starts");
    battle
}

/// A started NPC-vs-NPC battle driven by seeded dice.
///
/// Elements are drawn from the same dice, so the whole battle depends only
/// on the seed and levels.
///
/// # Panics
///
/// Never for the fixed IDs used here.
#[must_use]
pub fn seeded_npc_duel(seed: u64, level_a: u32, level_b: u32) -> Battle {
    let mut dice = SeededDice::new(seed);
    let pool = Element::NPC_POOL;
    let a = npc("a", level_a, pool[dice.pick(pool.len())]);
    let b = npc("b", level_b, pool[dice.pick(pool.len())]);

    let mut battle =
        Battle::new("headless", a, b, Box::new(dice)).expect("fixture ids are distinct");
    battle.start().expect("fresh battle starts");
    battle
}

/// Process turns until the battle completes or `max_turns` is reached.
///
/// Only suitable for battles where every side is an NPC. Returns the number
/// of turns processed.
pub fn run_to_completion(battle: &mut Battle, max_turns: u32) -> u32 {
    let mut turns = 0;
    while turns < max_turns && battle.process_turn().is_ok() {
        turns += 1;
    }
    tracing::debug!(battle_id = %battle.id(), turns, "Fixture battle finished");
    turns
}
