//! Error types for the `Cohort` facade.

use cohort_core::StartupError;
use cohort_storage::{ParticipantId, StoreError};

/// Errors from group operations.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// Configuration rejected before anything ran.
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// Checkpoint store error from an operator command.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The OS refused to start a participant thread.
    #[error("failed to spawn thread for participant {participant}: {source}")]
    Spawn {
        /// Participant whose thread could not start.
        participant: ParticipantId,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A participant thread panicked.
    #[error("participant {0} panicked")]
    ParticipantPanicked(ParticipantId),
}

impl CohortError {
    /// Whether the group was refused at startup.
    #[must_use]
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Startup(_))
    }
}
