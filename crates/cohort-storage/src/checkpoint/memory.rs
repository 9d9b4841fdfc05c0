//! In-memory checkpoint store.
//!
//! Keeps the encoded text of each record so that loads exercise the same
//! parser as the filesystem store, and so tests can plant corrupt records.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::store::CheckpointStore;
use crate::error::StoreError;
use crate::record::{CheckpointRecord, ParticipantId};

/// [`CheckpointStore`] holding every record in memory.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    records: RwLock<HashMap<ParticipantId, String>>,
}

impl InMemoryCheckpointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text for `participant`, bypassing the encoder.
    pub fn insert_raw(&self, participant: ParticipantId, text: impl Into<String>) {
        self.records.write().insert(participant, text.into());
    }

    /// Raw stored text for `participant`.
    #[must_use]
    pub fn raw(&self, participant: ParticipantId) -> Option<String> {
        self.records.read().get(&participant).cloned()
    }

    /// Number of participants with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no participant has a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self, participant: ParticipantId) -> Result<Option<CheckpointRecord>, StoreError> {
        let records = self.records.read();
        let Some(text) = records.get(&participant) else {
            return Ok(None);
        };
        CheckpointRecord::decode(participant, text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                participant,
                source,
            })
    }

    fn save(&self, record: &CheckpointRecord) -> Result<(), StoreError> {
        let encoded = record.encode();
        self.records.write().insert(record.participant, encoded);
        Ok(())
    }

    fn remove(&self, participant: ParticipantId) -> Result<bool, StoreError> {
        Ok(self.records.write().remove(&participant).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = InMemoryCheckpointStore::new();
        let record = CheckpointRecord::new(ParticipantId(0), 3, vec![-5, 0, 5]);
        store.save(&record).unwrap();
        assert_eq!(store.load(ParticipantId(0)).unwrap(), Some(record));
        assert_eq!(store.raw(ParticipantId(0)).as_deref(), Some("3\n-5 0 5 \n"));
    }

    #[test]
    fn test_planted_corrupt_record() {
        let store = InMemoryCheckpointStore::new();
        store.insert_raw(ParticipantId(1), "garbage");

        assert!(store.load(ParticipantId(1)).unwrap_err().is_corruption());
        assert!(store.load_or_none(ParticipantId(1)).is_none());
    }

    #[test]
    fn test_idempotent_save() {
        let store = InMemoryCheckpointStore::new();
        let record = CheckpointRecord::new(ParticipantId(2), 9, vec![1, 2]);
        store.save(&record).unwrap();
        let once = store.raw(ParticipantId(2));
        store.save(&record).unwrap();

        assert_eq!(store.raw(ParticipantId(2)), once);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = InMemoryCheckpointStore::new();
        store
            .save(&CheckpointRecord::new(ParticipantId(0), 3, vec![1]))
            .unwrap();
        assert!(store.remove(ParticipantId(0)).unwrap());
        assert!(store.is_empty());
    }
}
