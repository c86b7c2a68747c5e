//! Serializable battle views.
//!
//! A [`BattleSnapshot`] is a detached copy of everything a renderer needs.
//! It encodes to a compact binary form with `bincode` and yields a state
//! hash for determinism checks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::{BattleId, BattleState};
use crate::error::{BattleError, Result};
use crate::participant::{CombatParticipant, ParticipantId};

/// Read-only view of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Battle identifier.
    pub id: BattleId,
    /// Originating channel.
    pub channel_id: String,
    /// Lifecycle state.
    pub state: BattleState,
    /// Round counter.
    pub round: u32,
    /// Whose turn it is.
    pub current_turn: ParticipantId,
    /// Both participants, in turn order.
    pub participants: Vec<CombatParticipant>,
    /// Winner, once complete.
    pub winner: Option<ParticipantId>,
    /// Combat log, oldest first.
    pub log: Vec<String>,
    /// Last activity time.
    pub last_updated: DateTime<Utc>,
}

impl BattleSnapshot {
    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BattleError::Snapshot(e.to_string()))
    }

    /// Decode from bytes produced by [`Self::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| BattleError::Snapshot(e.to_string()))
    }

    /// Hash of the combat-relevant state.
    ///
    /// Identifiers and timestamps are excluded so that two runs with the
    /// same seed hash equal even when created at different times.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.hash(&mut hasher);
        self.round.hash(&mut hasher);
        self.participants
            .iter()
            .position(|p| p.id == self.current_turn)
            .hash(&mut hasher);

        for p in &self.participants {
            p.name.hash(&mut hasher);
            p.current_hp().hash(&mut hasher);
            p.current_mp().hash(&mut hasher);
            p.defense.hash(&mut hasher);
            p.element.hash(&mut hasher);
            p.status.hash(&mut hasher);
        }

        self.log.hash(&mut hasher);
        hasher.finish()
    }

    /// Participant lookup.
    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| &p.id == id)
    }
}
