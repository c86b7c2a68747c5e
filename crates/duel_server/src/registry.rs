//! Live battle registry.
//!
//! One coarse lock guards the whole map. Every operation holds it for its
//! full duration and never across an `.await`, which keeps turn processing
//! (fast and synchronous) strictly sequential per battle. A battle that
//! completes under the lock leaves the map in the same critical section, so
//! no other command can observe it finished but still registered.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use duel_core::battle::{Battle, BattleId, BattleState};
use duel_core::participant::ParticipantId;

use crate::error::{Result, ServerError};

/// Concurrency-safe map from battle ID to live battle.
#[derive(Debug, Default)]
pub struct BattleRegistry {
    battles: Mutex<HashMap<BattleId, Battle>>,
}

impl BattleRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BattleId, Battle>>> {
        self.battles
            .lock()
            .map_err(|_| ServerError::LockPoisoned("battle registry"))
    }

    /// Register a battle.
    ///
    /// # Errors
    ///
    /// [`ServerError::AlreadyInBattle`] if either participant is already in a
    /// live battle.
    pub fn insert(&self, battle: Battle) -> Result<BattleId> {
        let mut battles = self.lock()?;
        for participant in battle.participants() {
            if battles.values().any(|b| b.contains(&participant.id)) {
                return Err(ServerError::AlreadyInBattle(participant.id.clone()));
            }
        }

        let id = battle.id().clone();
        battles.insert(id.clone(), battle);
        tracing::info!(battle_id = %id, active = battles.len(), "Battle registered");
        Ok(id)
    }

    /// Find the battle a participant is fighting in (linear scan).
    pub fn find_by_participant(&self, participant: &ParticipantId) -> Result<Option<BattleId>> {
        let battles = self.lock()?;
        Ok(battles
            .iter()
            .find(|(_, battle)| battle.contains(participant))
            .map(|(id, _)| id.clone()))
    }

    /// Run `f` against a battle while holding the lock.
    ///
    /// # Errors
    ///
    /// [`ServerError::BattleNotFound`] if the ID is not registered.
    pub fn with_battle<R>(&self, id: &BattleId, f: impl FnOnce(&mut Battle) -> R) -> Result<R> {
        let mut battles = self.lock()?;
        let battle = battles
            .get_mut(id)
            .ok_or_else(|| ServerError::BattleNotFound(id.clone()))?;
        Ok(f(battle))
    }

    /// Like [`with_battle`](Self::with_battle), but a battle that `f` leaves
    /// complete is removed before the lock is released and handed back.
    ///
    /// # Errors
    ///
    /// [`ServerError::BattleNotFound`] if the ID is not registered.
    pub fn with_battle_retiring<R>(
        &self,
        id: &BattleId,
        f: impl FnOnce(&mut Battle) -> R,
    ) -> Result<(R, Option<Battle>)> {
        let mut battles = self.lock()?;
        let battle = battles
            .get_mut(id)
            .ok_or_else(|| ServerError::BattleNotFound(id.clone()))?;
        let value = f(battle);

        let retired = if battle.state() == BattleState::Complete {
            battles.remove(id)
        } else {
            None
        };
        if retired.is_some() {
            tracing::debug!(battle_id = %id, active = battles.len(), "Battle retired");
        }
        Ok((value, retired))
    }

    /// Remove a battle, returning it if it was registered.
    pub fn remove(&self, id: &BattleId) -> Result<Option<Battle>> {
        let removed = self.lock()?.remove(id);
        if removed.is_some() {
            tracing::debug!(battle_id = %id, "Battle removed");
        }
        Ok(removed)
    }

    /// Number of live battles.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether no battles are live.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Evict battles idle for longer than `stale_after` at `now`.
    ///
    /// Returns the number evicted.
    pub fn sweep_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> Result<usize> {
        let mut battles = self.lock()?;
        let before = battles.len();
        battles.retain(|_, battle| !battle.is_stale(now, stale_after));
        let removed = before - battles.len();

        if removed > 0 {
            tracing::info!(removed, active = battles.len(), "Cleaned up stale battles");
        }
        Ok(removed)
    }
}
