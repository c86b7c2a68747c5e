//! Error types for the duel engine.

use thiserror::Error;

use crate::battle::BattleState;
use crate::participant::ParticipantId;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for all battle engine errors.
///
/// Every error path leaves the battle structurally valid: the operation
/// that failed has not mutated any participant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// A participant tried to act while it is someone else's turn.
    #[error("It's not {0}'s turn")]
    NotYourTurn(ParticipantId),

    /// Action name is not one of attack, magic, defend, item.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Target is not a valid target for this action in this battle.
    #[error("Invalid target: {0}")]
    InvalidTarget(ParticipantId),

    /// The current participant has no pending action.
    #[error("No action selected for {0}")]
    NoActionSelected(ParticipantId),

    /// Operation requires an ongoing battle.
    #[error("Battle is not in progress (state: {0})")]
    NotOngoing(BattleState),

    /// Result requested before the battle finished.
    #[error("Battle is not complete (state: {0})")]
    NotComplete(BattleState),

    /// `start` called on a battle that already left the pending state.
    #[error("Battle has already started (state: {0})")]
    AlreadyStarted(BattleState),

    /// Participant ID is not part of this battle.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Both sides of a battle carry the same ID.
    #[error("A battle needs two distinct participants, got '{0}' twice")]
    DuplicateParticipant(ParticipantId),

    /// Element name outside the known vocabulary.
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// Element chart data failed to parse.
    #[error("Failed to parse element chart: {0}")]
    ChartParse(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot codec error: {0}")]
    Snapshot(String),
}
