//! Per-participant storage handle.
//!
//! The launcher builds one [`ParticipantStorage`] per participant and
//! injects it at startup. A handle can only read and write its owner's
//! record, which is how record ownership is enforced.

use std::fmt;
use std::sync::Arc;

use super::store::CheckpointStore;
use crate::error::StoreError;
use crate::record::{CheckpointRecord, ParticipantId};

/// Storage access scoped to a single participant.
#[derive(Clone)]
pub struct ParticipantStorage {
    owner: ParticipantId,
    store: Arc<dyn CheckpointStore>,
}

impl ParticipantStorage {
    /// Create a handle for `owner` over a shared store.
    #[must_use]
    pub fn new(owner: ParticipantId, store: Arc<dyn CheckpointStore>) -> Self {
        Self { owner, store }
    }

    /// The participant this handle belongs to.
    #[must_use]
    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    /// Load the owner's record.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the underlying store.
    pub fn load(&self) -> Result<Option<CheckpointRecord>, StoreError> {
        self.store.load(self.owner)
    }

    /// Load the owner's record, treating unreadable records as absent.
    #[must_use]
    pub fn load_or_none(&self) -> Option<CheckpointRecord> {
        self.store.load_or_none(self.owner)
    }

    /// Persist the owner's `(iteration, data)` snapshot.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the underlying store.
    pub fn save(&self, iteration: u64, data: &[i64]) -> Result<CheckpointRecord, StoreError> {
        let record = CheckpointRecord::new(self.owner, iteration, data.to_vec());
        self.store.save(&record)?;
        Ok(record)
    }
}

impl fmt::Debug for ParticipantStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantStorage")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
