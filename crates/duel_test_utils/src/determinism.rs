//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Seeded battles must replay exactly so balance runs and bug reports can
//! be reproduced. Sources of non-determinism include:
//!
//! - **Floating-point math**: damage formulas use
//!   [`duel_core::math::Fixed`] throughout.
//!
//! - **Map iteration order**: status effects live in a `BTreeMap`, so Burn
//!   and Poison always apply in the same order.
//!
//! - **Ambient randomness**: every roll comes from the battle's own dice.
//!
//! - **Wall-clock time**: IDs and timestamps are excluded from
//!   [`duel_core::snapshot::BattleSnapshot::state_hash`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use duel_core::battle::Battle;
use duel_core::snapshot::BattleSnapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns attempted per run.
    pub turns: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup multiple times and verify every run ends in the same state.
///
/// `step` is called `turns` times per run; `hash` reads the final state.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..turns {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Determinism check specialised for [`Battle`]: process turns, hash snapshots.
///
/// Turns past completion are rejected by the battle and leave it unchanged.
pub fn verify_battle_determinism<F>(setup: F, runs: usize, turns: u32) -> DeterminismResult
where
    F: Fn() -> Battle,
{
    verify_determinism(
        runs,
        turns,
        setup,
        |battle| {
            let _ = battle.process_turn();
        },
        |battle| battle.snapshot().state_hash(),
    )
}

/// Run the same battle on several threads and collect the final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_battles<F>(setup: F, num_battles: usize, turns: u32) -> DeterminismResult
where
    F: Fn() -> Battle + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup();
                    for _ in 0..turns {
                        let _ = battle.process_turn();
                    }
                    battle.snapshot().state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Compare two runs turn-by-turn, finding the first divergence.
///
/// `None` if the runs agree throughout, `Some(turn)` otherwise (0 means
/// the initial states already differ).
pub fn find_first_divergence<F>(setup: F, turns: u32) -> Option<u32>
where
    F: Fn() -> Battle,
{
    let mut first = setup();
    let mut second = setup();

    if first.snapshot().state_hash() != second.snapshot().state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        let _ = first.process_turn();
        let _ = second.process_turn();
        if first.snapshot().state_hash() != second.snapshot().state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Verify that a snapshot survives binary encoding with its hash intact.
pub fn verify_snapshot_determinism(battle: &Battle) -> bool {
    let snapshot = battle.snapshot();
    let Ok(bytes) = snapshot.encode() else {
        return false;
    };
    match BattleSnapshot::decode(&bytes) {
        Ok(restored) => restored.state_hash() == snapshot.state_hash(),
        Err(_) => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine inputs.
pub mod strategies {
    use duel_core::action::ActionKind;
    use duel_core::element::Element;
    use duel_core::stats::{CharacterSheet, CombatStats};
    use duel_core::status::StatusEffect;
    use proptest::prelude::*;

    /// Any element, including `None`.
    pub fn arb_element() -> impl Strategy<Value = Element> {
        prop_oneof![
            Just(Element::None),
            Just(Element::Fire),
            Just(Element::Water),
            Just(Element::Earth),
            Just(Element::Wind),
            Just(Element::Nature),
            Just(Element::Toxic),
            Just(Element::Lightning),
            Just(Element::Sound),
            Just(Element::Dark),
            Just(Element::Light),
            Just(Element::Frost),
            Just(Element::Ice),
            Just(Element::Gravity),
            Just(Element::Crystal),
            Just(Element::Arcane),
        ]
    }

    /// Any of the four actions.
    pub fn arb_action() -> impl Strategy<Value = ActionKind> {
        prop_oneof![
            Just(ActionKind::Attack),
            Just(ActionKind::Magic),
            Just(ActionKind::Defend),
            Just(ActionKind::Item),
        ]
    }

    /// Any status effect.
    pub fn arb_status() -> impl Strategy<Value = StatusEffect> {
        prop_oneof![
            Just(StatusEffect::Burn),
            Just(StatusEffect::Poison),
            Just(StatusEffect::Stun),
            Just(StatusEffect::Freeze),
            Just(StatusEffect::Defending),
        ]
    }

    /// Attribute values, deliberately exceeding the 300 cap.
    pub fn arb_attribute() -> impl Strategy<Value = u32> {
        0u32..2000
    }

    /// Any character sheet, including over-cap attributes.
    pub fn arb_sheet() -> impl Strategy<Value = CharacterSheet> {
        (
            (arb_attribute(), arb_attribute(), arb_attribute(), arb_attribute()),
            (arb_attribute(), arb_attribute(), arb_attribute()),
            arb_element(),
        )
            .prop_map(
                |((vitality, durability, speed, strength), (intelligence, mana, mastery), element)| {
                    CharacterSheet {
                        vitality,
                        durability,
                        speed,
                        strength,
                        intelligence,
                        mana,
                        mastery,
                        element,
                    }
                },
            )
    }

    /// Combat stats with at least 1 HP.
    pub fn arb_combat_stats() -> impl Strategy<Value = CombatStats> {
        (
            (1u32..5000, 0u32..3000, 0u32..3000, 0u32..3000),
            (0u32..5000, 0u32..3000, 0u32..150, 0u32..100),
        )
            .prop_map(
                |(
                    (max_hp, max_mp, physical_damage, magical_damage),
                    (defense, initiative, accuracy, dodge_chance),
                )| CombatStats {
                    max_hp,
                    max_mp,
                    physical_damage,
                    magical_damage,
                    defense,
                    initiative,
                    accuracy,
                    dodge_chance,
                },
            )
    }

    /// NPC level, including values above the stat cap.
    pub fn arb_level() -> impl Strategy<Value = u32> {
        0u32..100
    }

    /// A queue of percent rolls for scripted dice.
    pub fn arb_rolls(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0u32..100, 0..max_len)
    }

    /// A sequence of actions.
    pub fn arb_action_sequence(max_len: usize) -> impl Strategy<Value = Vec<ActionKind>> {
        prop::collection::vec(arb_action(), 1..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seeded_npc_duel;
    use proptest::prelude::*;

    #[test]
    fn test_seeded_duel_is_deterministic() {
        verify_battle_determinism(|| seeded_npc_duel(42, 4, 6), 3, 200).assert_deterministic();
    }

    #[test]
    fn test_parallel_duels_match() {
        run_parallel_battles(|| seeded_npc_duel(9, 5, 5), 4, 200).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| seeded_npc_duel(3, 1, 10), 200), None);
    }

    #[test]
    fn test_snapshot_hash_survives_encoding() {
        let mut battle = seeded_npc_duel(11, 2, 2);
        for _ in 0..10 {
            let _ = battle.process_turn();
        }
        assert!(verify_snapshot_determinism(&battle));
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        let hashes: Vec<u64> = (0..8)
            .map(|seed| {
                let mut battle = seeded_npc_duel(seed, 5, 5);
                for _ in 0..50 {
                    let _ = battle.process_turn();
                }
                battle.snapshot().state_hash()
            })
            .collect();
        let unique = DeterminismResult {
            is_deterministic: false,
            hashes,
            turns: 50,
        }
        .unique_hashes();
        assert!(unique.len() > 1);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
    }

    proptest! {
        /// Any seed and level pairing replays identically.
        #[test]
        fn prop_any_seed_is_deterministic(
            seed in any::<u64>(),
            level_a in 1u32..=10,
            level_b in 1u32..=10,
        ) {
            let result = verify_battle_determinism(
                move || seeded_npc_duel(seed, level_a, level_b),
                2,
                100,
            );
            prop_assert!(result.is_deterministic);
        }
    }
}
