//! Character records.
//!
//! The battle service only needs a key-value view of stored characters:
//! fetch a sheet before a battle and credit currency afterwards.

use std::collections::HashMap;
use std::sync::RwLock;

use duel_core::participant::ParticipantId;
use duel_core::stats::CharacterSheet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// A player's stored character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Owning player.
    pub owner: ParticipantId,
    /// Character name.
    pub name: String,
    /// Attribute sheet.
    pub sheet: CharacterSheet,
    /// Wallet balance.
    #[serde(default)]
    pub currency: u64,
}

impl CharacterRecord {
    /// New record with an empty wallet.
    #[must_use]
    pub fn new(owner: impl Into<ParticipantId>, name: impl Into<String>, sheet: CharacterSheet) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            sheet,
            currency: 0,
        }
    }
}

/// Key-value character storage keyed by owner.
pub trait CharacterStore: Send + Sync {
    /// Fetch a player's character.
    fn get(&self, owner: &ParticipantId) -> Result<Option<CharacterRecord>>;

    /// Insert or replace a character.
    fn upsert(&self, record: CharacterRecord) -> Result<()>;

    /// Delete a character. Returns whether one existed.
    fn remove(&self, owner: &ParticipantId) -> Result<bool>;

    /// Credit currency, returning the new balance.
    ///
    /// # Errors
    ///
    /// [`ServerError::NoCharacter`] if the owner has no record.
    fn add_currency(&self, owner: &ParticipantId, amount: u32) -> Result<u64>;
}

/// Process-local store, used by the binary and in tests.
#[derive(Debug, Default)]
pub struct InMemoryCharacterStore {
    records: RwLock<HashMap<ParticipantId, CharacterRecord>>,
}

impl InMemoryCharacterStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with records.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = CharacterRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.owner.clone(), r))
                    .collect(),
            ),
        }
    }
}

fn poisoned<T>(_: T) -> ServerError {
    ServerError::LockPoisoned("character store")
}

impl CharacterStore for InMemoryCharacterStore {
    fn get(&self, owner: &ParticipantId) -> Result<Option<CharacterRecord>> {
        Ok(self.records.read().map_err(poisoned)?.get(owner).cloned())
    }

    fn upsert(&self, record: CharacterRecord) -> Result<()> {
        self.records
            .write()
            .map_err(poisoned)?
            .insert(record.owner.clone(), record);
        Ok(())
    }

    fn remove(&self, owner: &ParticipantId) -> Result<bool> {
        Ok(self.records.write().map_err(poisoned)?.remove(owner).is_some())
    }

    fn add_currency(&self, owner: &ParticipantId, amount: u32) -> Result<u64> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .get_mut(owner)
            .ok_or_else(|| ServerError::NoCharacter(owner.clone()))?;
        record.currency = record.currency.saturating_add(u64::from(amount));
        Ok(record.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::element::Element;

    fn record(owner: &str) -> CharacterRecord {
        CharacterRecord::new(owner, "Hero", CharacterSheet::uniform(50, Element::Fire))
    }

    #[test]
    fn test_crud() {
        let store = InMemoryCharacterStore::new();
        let owner = ParticipantId::new("42");
        assert_eq!(store.get(&owner).unwrap(), None);

        store.upsert(record("42")).unwrap();
        assert_eq!(store.get(&owner).unwrap().unwrap().name, "Hero");

        assert!(store.remove(&owner).unwrap());
        assert!(!store.remove(&owner).unwrap());
    }

    #[test]
    fn test_add_currency() {
        let store = InMemoryCharacterStore::with_records([record("42")]);
        let owner = ParticipantId::new("42");
        assert_eq!(store.add_currency(&owner, 105).unwrap(), 105);
        assert_eq!(store.add_currency(&owner, 5).unwrap(), 110);
        assert_eq!(
            store.add_currency(&ParticipantId::new("7"), 5),
            Err(ServerError::NoCharacter(ParticipantId::new("7")))
        );
    }
}
