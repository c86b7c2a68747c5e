//! Headless duel runner.
//!
//! Runs seeded NPC-vs-NPC duels without a chat layer. Results go to stdout
//! as JSON, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # One duel with its full combat log
//! cargo run -p duel_headless -- duel --seed 42 --level-a 3 --level-b 5
//!
//! # Batch balance run
//! cargo run -p duel_headless -- batch --count 1000 --output results/
//!
//! # Determinism check
//! cargo run -p duel_headless -- verify --seed 12345 --runs 5
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    duel::{run_duel, DuelConfig, DEFAULT_MAX_TURNS},
};

#[derive(Parser)]
#[command(name = "duel_headless")]
#[command(about = "Headless duel runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single duel and print its outcome
    Duel {
        /// Dice seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// NPC level of side A
        #[arg(long, default_value = "1")]
        level_a: u32,

        /// NPC level of side B
        #[arg(long, default_value = "1")]
        level_b: u32,

        /// Turn cap before the duel is called a stalemate
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,
    },

    /// Run a batch of duels for balance testing
    Batch {
        /// Number of duels to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum parallel duels (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// NPC level of side A
        #[arg(long, default_value = "1")]
        level_a: u32,

        /// NPC level of side B
        #[arg(long, default_value = "1")]
        level_b: u32,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// NPC level of side A
        #[arg(long, default_value = "5")]
        level_a: u32,

        /// NPC level of side B
        #[arg(long, default_value = "5")]
        level_b: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr (stdout is for results)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Duel {
            seed,
            level_a,
            level_b,
            max_turns,
        } => cmd_duel(DuelConfig {
            seed,
            level_a,
            level_b,
            max_turns,
        }),
        Commands::Batch {
            count,
            seed,
            parallel,
            output,
            level_a,
            level_b,
        } => cmd_batch(BatchConfig {
            parallel,
            ..BatchConfig::new(count, level_a, level_b)
                .with_seed(seed)
                .with_output(output)
        }),
        Commands::Verify {
            seed,
            runs,
            level_a,
            level_b,
        } => cmd_verify(&DuelConfig::new(seed, level_a, level_b), runs),
    }
}

/// Run one duel
fn cmd_duel(config: DuelConfig) {
    let outcome = match run_duel(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Duel failed: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode outcome: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a batch of duels and save the results
fn cmd_batch(config: BatchConfig) {
    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        tracing::error!(error = %e, path = %config.output_dir.display(), "Failed to create output directory");
        std::process::exit(1);
    }

    let results_path = config.output_dir.join("batch_results.json");
    let results = run_batch(config);

    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Duels played: {}", summary.total_duels);
    if !results.errors.is_empty() {
        eprintln!("Duels FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Side A wins: {:.1}%", summary.win_rate_a * 100.0);
    eprintln!("Side B wins: {:.1}%", summary.win_rate_b * 100.0);
    eprintln!("Stalemates: {}", summary.capped);
    eprintln!("First mover wins: {}", summary.first_mover_wins);
    eprintln!("Average turns: {:.1}", summary.average_turns);
    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(config: &DuelConfig, runs: u32) {
    tracing::info!(seed = config.seed, runs, "Verifying determinism");

    match verify_determinism(config, runs) {
        Ok(report) if report.deterministic => {
            eprintln!("PASS: All {runs} runs produced identical results");
            if let Some(hash) = report.hashes.first() {
                eprintln!("  State hash: {hash:016x}");
            }
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            for (i, hash) in report.hashes.iter().enumerate() {
                eprintln!("  Run {i}: {hash:016x}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
}
