//! Error types for the battle service.

use duel_core::battle::BattleId;
use duel_core::error::BattleError;
use duel_core::participant::ParticipantId;
use thiserror::Error;

/// Result type alias using [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors surfaced to the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The engine rejected the operation.
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// Player has no live battle.
    #[error("{0} is not in a battle")]
    NotInBattle(ParticipantId),

    /// Player already fights in a live battle.
    #[error("{0} is already in a battle, finish or forfeit it first")]
    AlreadyInBattle(ParticipantId),

    /// Player has no stored character.
    #[error("{0} needs a character to battle")]
    NoCharacter(ParticipantId),

    /// Battle ID is not registered (finished or swept).
    #[error("Battle not found: {0}")]
    BattleNotFound(BattleId),

    /// Player tried to challenge themselves.
    #[error("You can't challenge yourself")]
    SelfChallenge,

    /// Challenger has no open challenge.
    #[error("No open challenge from {0}")]
    ChallengeNotFound(ParticipantId),

    /// Someone other than the target answered a challenge.
    #[error("This challenge isn't for {0}")]
    NotChallengeTarget(ParticipantId),

    /// The challenge outlived its answer window.
    #[error("Battle challenge from {0} expired")]
    ChallengeExpired(ParticipantId),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A shared lock was poisoned by a panicking holder.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}
