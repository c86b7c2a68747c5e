//! # Duel Server
//!
//! The process side of the battle engine.
//!
//! Owns the live battle registry, open PvP challenges and the sweeper that
//! evicts stale entries from both. Reads character sheets from a
//! [`store::CharacterStore`] and exposes the command flows the chat layer
//! drives through [`service::ArenaService`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod challenge;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;
pub mod store;
pub mod sweeper;

pub use challenge::{Challenge, ChallengeBoard};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use registry::BattleRegistry;
pub use service::{ArenaService, BattleReport, BattleStatus, BattleUpdate};
pub use store::{CharacterRecord, CharacterStore, InMemoryCharacterStore};
