//! Randomness seam for the engine.
//!
//! Every random decision in a battle (hit, dodge, critical, status proc,
//! initiative tie-break, NPC element) draws from a [`Dice`] owned by that
//! battle. Production code seeds a [`SeededDice`] once; tests replay exact
//! rolls with [`ScriptedDice`].

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform rolls.
pub trait Dice: Send + fmt::Debug {
    /// Uniform roll in `0..100`.
    fn roll_percent(&mut self) -> u32;

    /// Uniform index in `0..len` (always `0` when `len <= 1`).
    fn pick(&mut self, len: usize) -> usize;

    /// Fair coin; `true` means "heads".
    fn coin_flip(&mut self) -> bool {
        self.pick(2) == 0
    }
}

/// Seeded PRNG dice. Same seed, same battle.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    /// Create dice from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create dice seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Dice for SeededDice {
    fn roll_percent(&mut self) -> u32 {
        self.rng.gen_range(0..100)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Dice that replay a fixed queue of rolls.
///
/// `pick(len)` consumes one roll and reduces it modulo `len`, so a scripted
/// `0` always selects the first option. Once the queue is empty every roll
/// returns the fallback value.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    fallback: u32,
}

impl ScriptedDice {
    /// Dice that return `rolls` in order, then `99` forever.
    ///
    /// `99` is the "nothing happens" roll: it never dodges, never crits and
    /// never procs a status, but it also misses unless accuracy exceeds 99.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 99,
        }
    }

    /// Override the roll used once the script runs out.
    #[must_use]
    pub fn with_fallback(mut self, fallback: u32) -> Self {
        self.fallback = fallback;
        self
    }

    /// Append more rolls to the end of the script.
    pub fn push(&mut self, rolls: impl IntoIterator<Item = u32>) {
        self.rolls.extend(rolls);
    }

    /// Number of scripted rolls not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    fn next(&mut self) -> u32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

impl Dice for ScriptedDice {
    fn roll_percent(&mut self) -> u32 {
        self.next() % 100
    }

    fn pick(&mut self, len: usize) -> usize {
        let roll = self.next();
        if len <= 1 {
            return 0;
        }
        roll as usize % len
    }
}
