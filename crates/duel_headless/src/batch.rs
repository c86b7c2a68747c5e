//! Batch duel runner for balance testing.
//!
//! Runs many seeds in parallel using rayon and summarizes how often each
//! side wins.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::duel::{run_duel, DuelConfig, DuelOutcome, DuelSide, DEFAULT_MAX_TURNS};
use crate::error::{HeadlessError, Result};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of duels to run
    pub duel_count: u32,
    /// Worker threads (0 = use rayon default)
    pub parallel: u32,
    /// Seed of the first duel; duel `i` uses `seed_start + i`
    pub seed_start: u64,
    /// NPC level of side A
    pub level_a: u32,
    /// NPC level of side B
    pub level_b: u32,
    /// Turn cap per duel
    pub max_turns: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            duel_count: 100,
            parallel: 0,
            seed_start: 0,
            level_a: 1,
            level_b: 1,
            max_turns: DEFAULT_MAX_TURNS,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create config for a number of duels between two levels
    #[must_use]
    pub fn new(duel_count: u32, level_a: u32, level_b: u32) -> Self {
        Self {
            duel_count,
            level_a,
            level_b,
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    fn duel(&self, index: u32) -> DuelConfig {
        DuelConfig {
            seed: self.seed_start.wrapping_add(u64::from(index)),
            level_a: self.level_a,
            level_b: self.level_b,
            max_turns: self.max_turns,
        }
    }
}

/// Aggregate numbers over a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    /// Duels that produced an outcome
    pub total_duels: u32,
    /// Wins for side A
    pub wins_a: u32,
    /// Wins for side B
    pub wins_b: u32,
    /// Duels stopped by the turn cap
    pub capped: u32,
    /// Wins for whichever side moved first
    pub first_mover_wins: u32,
    /// Side A win rate over all duels
    pub win_rate_a: f64,
    /// Side B win rate over all duels
    pub win_rate_b: f64,
    /// Mean turns per duel
    pub average_turns: f64,
}

impl BatchSummary {
    /// Summarize a set of outcomes
    #[must_use]
    pub fn from_duels(duels: &[DuelOutcome]) -> Self {
        let total = duels.len() as u32;
        if total == 0 {
            return Self::default();
        }

        let count = |side: DuelSide| duels.iter().filter(|d| d.winner == Some(side)).count() as u32;
        let wins_a = count(DuelSide::A);
        let wins_b = count(DuelSide::B);
        let first_mover_wins = duels
            .iter()
            .filter(|d| d.winner == Some(d.first_mover))
            .count() as u32;
        let turns: u64 = duels.iter().map(|d| u64::from(d.turns)).sum();

        Self {
            total_duels: total,
            wins_a,
            wins_b,
            capped: total - wins_a - wins_b,
            first_mover_wins,
            win_rate_a: f64::from(wins_a) / f64::from(total),
            win_rate_b: f64::from(wins_b) / f64::from(total),
            average_turns: turns as f64 / f64::from(total),
        }
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Duel index
    pub duel_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Results from a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual duel outcomes, without logs
    pub duels: Vec<DuelOutcome>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run a batch of duels
#[must_use]
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    tracing::info!(
        duels = config.duel_count,
        level_a = config.level_a,
        level_b = config.level_b,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    let run_all = || -> Vec<std::result::Result<DuelOutcome, BatchError>> {
        (0..config.duel_count)
            .into_par_iter()
            .map(|i| {
                let duel = config.duel(i);
                run_duel(&duel).map(DuelOutcome::without_log).map_err(|e| {
                    tracing::warn!(duel = i, seed = duel.seed, error = %e, "Duel failed");
                    BatchError {
                        duel_index: i,
                        seed: duel.seed,
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build thread pool, using the global one");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut duels = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(duel) => duels.push(duel),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_duels(&duels);
    let duration_seconds = start.elapsed().as_secs_f64();

    tracing::info!(
        duels = duels.len(),
        failed = errors.len(),
        win_rate_a = summary.win_rate_a,
        duration_secs = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        duels,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed replayed
    pub seed: u64,
    /// Final state hash of each run
    pub hashes: Vec<u64>,
    /// Whether every run produced the same outcome
    pub deterministic: bool,
}

/// Replay the same duel `runs` times and compare outcomes.
pub fn verify_determinism(config: &DuelConfig, runs: u32) -> Result<VerifyReport> {
    if runs == 0 {
        return Err(HeadlessError::NoRuns);
    }

    let outcomes = (0..runs)
        .map(|_| run_duel(config))
        .collect::<Result<Vec<_>>>()?;

    let first = &outcomes[0];
    let deterministic = outcomes.iter().all(|o| o == first);
    if !deterministic {
        tracing::warn!(seed = config.seed, runs, "Non-determinism detected");
    }

    Ok(VerifyReport {
        seed: config.seed,
        hashes: outcomes.iter().map(|o| o.state_hash).collect(),
        deterministic,
    })
}
