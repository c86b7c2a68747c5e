//! Error types for headless runs.

use duel_core::error::BattleError;
use thiserror::Error;

/// Result type alias using [`HeadlessError`].
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Errors from running or persisting duels.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// The engine rejected an operation.
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// Reading or writing results failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Results could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A verification was asked for zero runs.
    #[error("Verification needs at least one run")]
    NoRuns,
}
