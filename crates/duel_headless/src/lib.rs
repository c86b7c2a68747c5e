//! Headless duel runner for balance testing and CI verification.
//!
//! Runs seeded NPC-vs-NPC duels with no chat layer attached:
//!
//! - **Single duels**: full combat log and final state as JSON
//! - **Batch runs**: many seeds in parallel with rayon, summarized win rates
//! - **Determinism checks**: the same seed replayed until the state hashes agree
//!
//! # Example
//!
//! ```bash
//! cargo run -p duel_headless -- duel --seed 42 --level-a 3 --level-b 5
//! cargo run -p duel_headless -- batch --count 1000 --output results/
//! cargo run -p duel_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod duel;
pub mod error;

pub use batch::{
    run_batch, verify_determinism, BatchConfig, BatchError, BatchResults, BatchSummary, VerifyReport,
};
pub use duel::{run_duel, DuelConfig, DuelOutcome, DuelSide};
pub use error::{HeadlessError, Result};
