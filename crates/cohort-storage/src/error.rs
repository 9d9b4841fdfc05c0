//! Error types for checkpoint storage.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::{ParticipantId, RecordParseError};

/// Errors from checkpoint store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading or writing a checkpoint file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored record exists but could not be parsed.
    #[error("corrupt checkpoint for participant {participant}: {source}")]
    Corrupt {
        /// Owner of the unreadable record.
        participant: ParticipantId,
        /// Why parsing failed.
        #[source]
        source: RecordParseError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the stored record was present but unreadable.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
