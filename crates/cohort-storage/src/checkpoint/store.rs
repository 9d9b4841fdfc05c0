//! Checkpoint store trait and the filesystem implementation.
//!
//! The [`CheckpointStore`] trait abstracts checkpoint I/O so participants
//! don't need to know whether records live on local disk or in memory.
//!
//! [`FileSystemCheckpointStore`] is the production implementation. A save
//! writes a uniquely named temporary file next to the target, fsyncs it,
//! then renames it over the target. A reader therefore sees either the old
//! record or the new one, never a mix of both.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::layout::CheckpointPaths;
use crate::error::StoreError;
use crate::record::{CheckpointRecord, ParticipantId};

/// Storage for the latest checkpoint record of each participant.
///
/// Implementations keep exactly one record per participant and must never
/// let one participant's save touch another participant's record.
pub trait CheckpointStore: Send + Sync {
    /// Load the most recently saved record for `participant`.
    ///
    /// Returns `Ok(None)` if the participant has never saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the record cannot be read and
    /// [`StoreError::Corrupt`] if it cannot be parsed.
    fn load(&self, participant: ParticipantId) -> Result<Option<CheckpointRecord>, StoreError>;

    /// Durably write `record`, atomically replacing the owner's previous
    /// record. Saving the same record twice leaves the same stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails. The previous record,
    /// if any, is left intact.
    fn save(&self, record: &CheckpointRecord) -> Result<(), StoreError>;

    /// Delete the record for `participant`.
    ///
    /// Returns whether a record existed. Never used by the checkpoint
    /// protocol itself, only by operator tooling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the record exists but cannot be removed.
    fn remove(&self, participant: ParticipantId) -> Result<bool, StoreError>;

    /// Load a record, treating every failure as "no checkpoint".
    ///
    /// Unreadable and corrupt records are logged and reported as `None`
    /// so that recovery falls back to a fresh start.
    fn load_or_none(&self, participant: ParticipantId) -> Option<CheckpointRecord> {
        match self.load(participant) {
            Ok(record) => record,
            Err(e) => {
                warn!(%participant, error = %e, "checkpoint unreadable, ignoring it");
                None
            }
        }
    }
}

/// [`CheckpointStore`] backed by one text file per participant.
#[derive(Debug, Clone)]
pub struct FileSystemCheckpointStore {
    paths: CheckpointPaths,
}

impl FileSystemCheckpointStore {
    /// Create a store rooted at `root`. The directory is created on the
    /// first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: CheckpointPaths::new(root),
        }
    }

    /// Path generator used by this store.
    #[must_use]
    pub fn paths(&self) -> &CheckpointPaths {
        &self.paths
    }

    /// List the participants that currently have a record file, sorted by
    /// rank. A missing root directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<ParticipantId>, StoreError> {
        let root = self.paths.root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(root, e)),
        };

        let mut participants = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(root, e))?;
            let name = entry.file_name();
            if let Some(participant) = name
                .to_str()
                .and_then(CheckpointPaths::participant_from_file_name)
            {
                participants.push(participant);
            }
        }
        participants.sort_unstable();
        Ok(participants)
    }

    fn write_atomic(&self, participant: ParticipantId, contents: &str) -> Result<(), StoreError> {
        let root = self.paths.root();
        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&CheckpointPaths::temp_prefix(participant))
            .suffix(".tmp")
            .tempfile_in(root)
            .map_err(|e| StoreError::io(root, e))?;
        let tmp_path = tmp.path().to_path_buf();

        tmp.write_all(contents.as_bytes())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(&tmp_path, e))?;

        let target = self.paths.record(participant);
        tmp.persist(&target)
            .map_err(|e| StoreError::io(&target, e.error))?;
        sync_dir(root);
        trace!(%participant, path = %target.display(), "checkpoint file replaced");
        Ok(())
    }
}

impl CheckpointStore for FileSystemCheckpointStore {
    fn load(&self, participant: ParticipantId) -> Result<Option<CheckpointRecord>, StoreError> {
        let path = self.paths.record(participant);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%participant, "no checkpoint file");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        CheckpointRecord::decode(participant, &text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                participant,
                source,
            })
    }

    fn save(&self, record: &CheckpointRecord) -> Result<(), StoreError> {
        self.write_atomic(record.participant, &record.encode())
    }

    fn remove(&self, participant: ParticipantId) -> Result<bool, StoreError> {
        let path = self.paths.record(participant);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

/// Persist the rename itself. Best effort: the record file is already
/// complete and fsynced at this point.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
