//! On-disk layout for participant checkpoints.
//!
//! ## Directory Layout
//!
//! ```text
//! checkpoints/
//! ├── checkpoint_rank_0.txt
//! ├── checkpoint_rank_1.txt
//! └── checkpoint_rank_2.txt
//! ```
//!
//! One file per participant, keyed by rank. Temporary files used during an
//! atomic replace start with a dot and never match the record pattern.

use std::path::{Path, PathBuf};

use crate::record::ParticipantId;

const FILE_PREFIX: &str = "checkpoint_rank_";
const FILE_SUFFIX: &str = ".txt";

/// Deterministic path generator for checkpoint files.
///
/// Stateless: it only computes paths, never performs I/O.
#[derive(Debug, Clone)]
pub struct CheckpointPaths {
    root: PathBuf,
}

impl CheckpointPaths {
    /// Create a path generator rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every participant's record.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of a participant's record, without the directory.
    #[must_use]
    pub fn file_name(participant: ParticipantId) -> String {
        format!("{FILE_PREFIX}{participant}{FILE_SUFFIX}")
    }

    /// Full path of a participant's record.
    #[must_use]
    pub fn record(&self, participant: ParticipantId) -> PathBuf {
        self.root.join(Self::file_name(participant))
    }

    /// Prefix for temporary files written while replacing a record.
    #[must_use]
    pub fn temp_prefix(participant: ParticipantId) -> String {
        format!(".{FILE_PREFIX}{participant}.")
    }

    /// Recover the owner from a record file name.
    ///
    /// Returns `None` for anything that is not a record file, including
    /// temporary files.
    #[must_use]
    pub fn participant_from_file_name(name: &str) -> Option<ParticipantId> {
        name.strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_SUFFIX)?
            .parse::<u32>()
            .ok()
            .map(ParticipantId)
    }
}

impl Default for CheckpointPaths {
    fn default() -> Self {
        Self::new("checkpoints")
    }
}
