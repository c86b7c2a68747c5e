//! Experience and currency payouts.
//!
//! The engine computes rewards for every completed battle. Whether they are
//! applied is the caller's decision: NPC winners get nothing.

use serde::{Deserialize, Serialize};

use crate::math::{floor_to_u32, from_stat, percent};
use crate::participant::ParticipantId;

/// Reward constants.
///
/// ```text
/// experience = (base_experience + rounds × experience_per_round) × modifier
/// currency   = base_currency + rounds × currency_per_round
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Experience before the per-round bonus.
    pub base_experience: u32,
    /// Experience per round fought.
    pub experience_per_round: u32,
    /// Experience modifier in percent.
    pub experience_modifier_percent: u32,
    /// Currency before the per-round bonus.
    pub base_currency: u32,
    /// Currency per round fought.
    pub currency_per_round: u32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            base_experience: 50,
            experience_per_round: 10,
            experience_modifier_percent: 100,
            base_currency: 100,
            currency_per_round: 5,
        }
    }
}

impl RewardTable {
    /// Rewards for a battle that lasted `rounds` rounds.
    #[must_use]
    pub fn compute(&self, rounds: u32) -> Rewards {
        let raw_experience = self
            .base_experience
            .saturating_add(rounds.saturating_mul(self.experience_per_round));
        let experience = floor_to_u32(
            from_stat(raw_experience).saturating_mul(percent(self.experience_modifier_percent)),
        );
        let currency = self
            .base_currency
            .saturating_add(rounds.saturating_mul(self.currency_per_round));
        Rewards {
            experience,
            currency,
        }
    }
}

/// Computed payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rewards {
    /// Experience points.
    pub experience: u32,
    /// Currency.
    pub currency: u32,
}

/// Immutable summary of a completed battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleResult {
    /// Participant left standing.
    pub winner: ParticipantId,
    /// Participant at 0 HP.
    pub loser: ParticipantId,
    /// Rounds fought.
    pub rounds: u32,
    /// Winner's remaining HP.
    pub winner_hp: u32,
    /// Payout for the winner.
    pub rewards: Rewards,
}

impl BattleResult {
    /// Whether the caller should apply the rewards (human winners only).
    #[must_use]
    pub fn rewards_apply(&self) -> bool {
        !self.winner.is_npc()
    }
}
