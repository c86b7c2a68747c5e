//! # Duel Core
//!
//! Turn-based 1v1 combat engine for the Crispy Arena chat game.
//!
//! This crate contains **only** engine logic:
//! - No chat-platform rendering
//! - No persistence
//! - No async and no IO
//! - No ambient randomness (every battle owns an injected [`dice::Dice`])
//!
//! This separation enables:
//! - Reproducible battles from a seed
//! - Headless balance runs
//! - Exact tests with scripted rolls
//!
//! ## Crate Structure
//!
//! - [`stats`] - Character sheets and combat stat projection
//! - [`element`] - Elements, the effectiveness chart and element statuses
//! - [`status`] - Timed status effects
//! - [`participant`] - One side of a battle
//! - [`action`] - Action resolution (attack, magic, defend, item)
//! - [`battle`] - The battle state machine
//! - [`npc`] - NPC decision policy and opponent templates
//! - [`rewards`] - Experience and currency payouts
//! - [`snapshot`] - Serializable battle views
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod battle;
pub mod dice;
pub mod element;
pub mod error;
pub mod math;
pub mod npc;
pub mod participant;
pub mod rewards;
pub mod snapshot;
pub mod stats;
pub mod status;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{ActionKind, ActionOutcome, OutcomeKind};
    pub use crate::battle::{Battle, BattleId, BattleState};
    pub use crate::dice::{Dice, ScriptedDice, SeededDice};
    pub use crate::element::{Element, ElementChart};
    pub use crate::error::{BattleError, Result};
    pub use crate::math::Fixed;
    pub use crate::participant::{CombatParticipant, ParticipantId, PendingAction};
    pub use crate::rewards::{BattleResult, RewardTable, Rewards};
    pub use crate::snapshot::BattleSnapshot;
    pub use crate::stats::{CharacterSheet, CombatStats};
    pub use crate::status::{StatusEffect, StatusEffects};
}
