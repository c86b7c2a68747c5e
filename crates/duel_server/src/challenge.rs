//! Open PvP challenges.
//!
//! A challenge waits for its target to accept or decline. Each challenger
//! has at most one open challenge; issuing another replaces it. Challenges
//! older than the configured lifetime can no longer be answered and are
//! dropped by the sweeper.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use duel_core::participant::ParticipantId;
use serde::Serialize;

use crate::error::{Result, ServerError};

/// A pending invitation to a PvP battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    /// Player who issued the challenge.
    pub challenger: ParticipantId,
    /// Display name of the challenger.
    pub challenger_name: String,
    /// The only player allowed to answer.
    pub target: ParticipantId,
    /// Channel the battle will run in.
    pub channel_id: String,
    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
}

impl Challenge {
    /// Whether the challenge is at least `ttl` old at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.issued_at >= ttl
    }
}

/// Open challenges keyed by challenger.
#[derive(Debug, Default)]
pub struct ChallengeBoard {
    open: Mutex<HashMap<ParticipantId, Challenge>>,
}

impl ChallengeBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ParticipantId, Challenge>>> {
        self.open
            .lock()
            .map_err(|_| ServerError::LockPoisoned("challenge board"))
    }

    /// Post a challenge, replacing any earlier one from the same challenger.
    pub fn issue(&self, challenge: Challenge) -> Result<()> {
        let mut open = self.lock()?;
        tracing::info!(
            challenger = %challenge.challenger,
            target = %challenge.target,
            channel = %challenge.channel_id,
            "Challenge issued"
        );
        if let Some(old) = open.insert(challenge.challenger.clone(), challenge) {
            tracing::debug!(challenger = %old.challenger, target = %old.target, "Challenge replaced");
        }
        Ok(())
    }

    /// The open challenge from `challenger`, if any.
    pub fn pending(&self, challenger: &ParticipantId) -> Result<Option<Challenge>> {
        Ok(self.lock()?.get(challenger).cloned())
    }

    /// Remove and return the challenge `challenger` sent to `target`.
    ///
    /// # Errors
    ///
    /// - [`ServerError::ChallengeNotFound`] if `challenger` has none open
    /// - [`ServerError::NotChallengeTarget`] if it was sent to someone else
    ///   (the challenge stays open)
    /// - [`ServerError::ChallengeExpired`] if it is `ttl` old (it is dropped)
    pub fn take_for(
        &self,
        target: &ParticipantId,
        challenger: &ParticipantId,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<Challenge> {
        let mut open = self.lock()?;
        let challenge = open
            .get(challenger)
            .ok_or_else(|| ServerError::ChallengeNotFound(challenger.clone()))?;
        if challenge.target != *target {
            return Err(ServerError::NotChallengeTarget(target.clone()));
        }
        let expired = challenge.is_expired(now, ttl);

        open.remove(challenger)
            .filter(|_| !expired)
            .ok_or_else(|| ServerError::ChallengeExpired(challenger.clone()))
    }

    /// Drop every challenge that is `ttl` old at `now`.
    ///
    /// Returns the number dropped.
    pub fn sweep_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<usize> {
        let mut open = self.lock()?;
        let before = open.len();
        open.retain(|_, challenge| !challenge.is_expired(now, ttl));
        let removed = before - open.len();

        if removed > 0 {
            tracing::info!(removed, open = open.len(), "Battle challenge expired");
        }
        Ok(removed)
    }

    /// Number of open challenges.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether no challenges are open.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}
