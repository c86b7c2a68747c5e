//! Server configuration.
//!
//! Loaded from RON; every field has a default so a partial file works.
//!
//! ```ron
//! ServerConfig(
//!     sweep_interval_secs: 900,
//!     stale_after_secs: 1800,
//!     npc_turn_delay_ms: 1000,
//!     challenge_ttl_secs: 60,
//!     rewards: RewardTable(base_experience: 50),
//!     element_chart: Some("data/elements.ron"),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use duel_core::element::ElementChart;
use duel_core::rewards::RewardTable;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DUEL_CONFIG";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How often the stale-battle sweeper runs.
    pub sweep_interval_secs: u64,
    /// Idle time after which a battle is evicted.
    pub stale_after_secs: u64,
    /// Pause before each automatic NPC turn.
    pub npc_turn_delay_ms: u64,
    /// How long a PvP challenge can be answered.
    pub challenge_ttl_secs: u64,
    /// Reward constants.
    pub rewards: RewardTable,
    /// Optional RON element chart replacing the built-in one.
    pub element_chart: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 15 * 60,
            stale_after_secs: 30 * 60,
            npc_turn_delay_ms: 1000,
            challenge_ttl_secs: 60,
            rewards: RewardTable::default(),
            element_chart: None,
        }
    }
}

impl ServerConfig {
    /// Load from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ron_str(&contents)
    }

    /// Parse from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from the file named by `DUEL_CONFIG`, else defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Sweeper period.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Staleness threshold.
    #[must_use]
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::from_std(Duration::from_secs(self.stale_after_secs))
            .unwrap_or(chrono::Duration::MAX)
    }

    /// PvP challenge answer window.
    #[must_use]
    pub fn challenge_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(Duration::from_secs(self.challenge_ttl_secs))
            .unwrap_or(chrono::Duration::MAX)
    }

    /// NPC pacing delay.
    #[must_use]
    pub fn npc_turn_delay(&self) -> Duration {
        Duration::from_millis(self.npc_turn_delay_ms)
    }

    /// The configured element chart, or the built-in default.
    pub fn load_chart(&self) -> Result<ElementChart> {
        let Some(path) = &self.element_chart else {
            return Ok(ElementChart::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok(ElementChart::from_ron(&contents)?)
    }
}
