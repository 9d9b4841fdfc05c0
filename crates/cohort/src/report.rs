//! Outcome of a group run.

use cohort_core::{RunSummary, StartKind, Termination};
use cohort_storage::ParticipantId;

/// Per-participant results of one [`crate::Cohort::run`], in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    summaries: Vec<RunSummary>,
}

impl GroupReport {
    pub(crate) fn new(mut summaries: Vec<RunSummary>) -> Self {
        summaries.sort_by_key(|s| s.participant);
        Self { summaries }
    }

    /// Every participant's summary.
    #[must_use]
    pub fn summaries(&self) -> &[RunSummary] {
        &self.summaries
    }

    /// Summary for one participant.
    #[must_use]
    pub fn summary(&self, participant: ParticipantId) -> Option<&RunSummary> {
        self.summaries.iter().find(|s| s.participant == participant)
    }

    /// Whether any participant ended with the injected fault.
    ///
    /// The binary turns this into a failure exit status.
    #[must_use]
    pub fn any_faulted(&self) -> bool {
        self.summaries.iter().any(RunSummary::faulted)
    }

    /// Participants that ended with the injected fault.
    #[must_use]
    pub fn faulted(&self) -> Vec<ParticipantId> {
        self.summaries
            .iter()
            .filter(|s| s.faulted())
            .map(|s| s.participant)
            .collect()
    }

    /// Participants that resumed from a checkpoint.
    #[must_use]
    pub fn recovered(&self) -> Vec<ParticipantId> {
        self.summaries
            .iter()
            .filter(|s| s.start == StartKind::Recovered)
            .map(|s| s.participant)
            .collect()
    }

    /// Whether every participant terminated normally.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.summaries
            .iter()
            .all(|s| s.termination == Termination::Normal)
    }

    /// Total number of failed checkpoint saves across the group.
    #[must_use]
    pub fn failed_saves(&self) -> usize {
        self.summaries
            .iter()
            .map(|s| s.failed_checkpoints.len())
            .sum()
    }
}
