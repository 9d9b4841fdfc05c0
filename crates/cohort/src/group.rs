//! Group launcher.
//!
//! A [`Cohort`] owns the validated configuration, the checkpoint store and
//! the hooks shared by every participant. [`Cohort::run`] performs one
//! launch of the whole group:
//!
//! 1. One barrier membership and one storage handle per rank
//! 2. One OS thread per participant, named `participant-<id>`
//! 3. Join every thread and collect the per-participant summaries
//!
//! Relaunching after a fault is just calling `run` again (or starting the
//! binary again): each participant goes through startup and recovers from
//! its own checkpoint.

use std::sync::Arc;
use std::thread;

use cohort_core::{
    GroupBarrier, GroupConfig, Participant, ParticipantContext, ParticipantListener,
    StartupError, UpdateRule,
};
use cohort_storage::{CheckpointRecord, CheckpointStore, ParticipantId, ParticipantStorage};
use tracing::{debug, error, info};

use crate::builder::CohortBuilder;
use crate::config::CohortConfig;
use crate::error::CohortError;
use crate::report::GroupReport;

/// What the store currently holds for one participant.
#[derive(Debug)]
pub enum CheckpointStatus {
    /// No checkpoint; the participant would start fresh.
    Missing,
    /// A usable checkpoint; the participant would resume from it.
    Valid(CheckpointRecord),
    /// A record exists but cannot be used; the participant would start
    /// fresh.
    Unusable(String),
}

/// A configured participant group.
pub struct Cohort {
    config: CohortConfig,
    store: Arc<dyn CheckpointStore>,
    rule: Arc<dyn UpdateRule>,
    listener: Arc<dyn ParticipantListener>,
}

impl Cohort {
    /// Start building a group.
    #[must_use]
    pub fn builder() -> CohortBuilder {
        CohortBuilder::new()
    }

    pub(crate) fn from_parts(
        config: CohortConfig,
        store: Arc<dyn CheckpointStore>,
        rule: Arc<dyn UpdateRule>,
        listener: Arc<dyn ParticipantListener>,
    ) -> Self {
        Self {
            config,
            store,
            rule,
            listener,
        }
    }

    /// Validated configuration.
    #[must_use]
    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Group parameters.
    #[must_use]
    pub fn group(&self) -> &GroupConfig {
        &self.config.group
    }

    /// Shared checkpoint store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Launch every participant and wait for all of them to terminate.
    ///
    /// A participant ending with the injected fault is not an error; it is
    /// reported in the returned [`GroupReport`].
    ///
    /// # Errors
    ///
    /// Returns [`CohortError::Startup`] if the group cannot be sized,
    /// [`CohortError::Spawn`] if a participant thread cannot be started,
    /// and [`CohortError::ParticipantPanicked`] if a participant thread
    /// panicked. Every started thread is joined before an error is
    /// returned.
    pub fn run(&self) -> Result<GroupReport, CohortError> {
        let group = Arc::new(self.config.group.clone());
        let size = usize::try_from(group.group_size).map_err(|_| {
            StartupError::InvalidConfig(format!(
                "group_size {} does not fit this platform",
                group.group_size
            ))
        })?;

        info!(
            group_size = size,
            interval = group.checkpoint_interval,
            max_iterations = group.max_iterations,
            fault = ?group.fault,
            "launching group"
        );

        let mut handles = Vec::with_capacity(size);
        let mut spawn_error = None;
        for member in GroupBarrier::with_members(size) {
            let participant = member.participant();
            let ctx = ParticipantContext {
                config: Arc::clone(&group),
                storage: ParticipantStorage::new(participant, Arc::clone(&self.store)),
                barrier: member,
                rule: Arc::clone(&self.rule),
                listener: Arc::clone(&self.listener),
            };
            let spawned = thread::Builder::new()
                .name(format!("participant-{participant}"))
                .spawn(move || Participant::start(ctx).run());
            match spawned {
                Ok(handle) => handles.push((participant, handle)),
                Err(source) => {
                    error!(%participant, error = %source, "failed to spawn participant");
                    spawn_error = Some(CohortError::Spawn {
                        participant,
                        source,
                    });
                    break;
                }
            }
        }

        let mut summaries = Vec::with_capacity(handles.len());
        let mut panicked = None;
        for (participant, handle) in handles {
            match handle.join() {
                Ok(summary) => {
                    debug!(
                        %participant,
                        final_iteration = summary.final_iteration,
                        termination = ?summary.termination,
                        "participant joined"
                    );
                    summaries.push(summary);
                }
                Err(_) => {
                    error!(%participant, "participant thread panicked");
                    panicked.get_or_insert(participant);
                }
            }
        }

        if let Some(e) = spawn_error {
            return Err(e);
        }
        if let Some(participant) = panicked {
            return Err(CohortError::ParticipantPanicked(participant));
        }

        let report = GroupReport::new(summaries);
        if report.any_faulted() {
            info!(faulted = ?report.faulted(), "group drained with faulted participants");
        } else {
            info!("group completed");
        }
        Ok(report)
    }

    /// Current checkpoint of every participant, in rank order.
    #[must_use]
    pub fn inspect(&self) -> Vec<(ParticipantId, CheckpointStatus)> {
        self.config
            .group
            .participants()
            .map(|participant| {
                let status = match self.store.load(participant) {
                    Ok(None) => CheckpointStatus::Missing,
                    Ok(Some(record)) if record.data.len() != self.config.group.data_len => {
                        CheckpointStatus::Unusable(format!(
                            "vector length {} does not match configured length {}",
                            record.data.len(),
                            self.config.group.data_len
                        ))
                    }
                    Ok(Some(record)) => CheckpointStatus::Valid(record),
                    Err(e) => CheckpointStatus::Unusable(e.to_string()),
                };
                (participant, status)
            })
            .collect()
    }

    /// Delete every participant's checkpoint so the next run starts fresh.
    ///
    /// Returns how many records were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CohortError::Store`] if a record exists but cannot be
    /// removed.
    pub fn reset(&self) -> Result<usize, CohortError> {
        let mut removed = 0;
        for participant in self.config.group.participants() {
            if self.store.remove(participant)? {
                info!(%participant, "checkpoint removed");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cohort")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::EventLog;
    use cohort_storage::InMemoryCheckpointStore;

    fn in_memory(group: GroupConfig) -> (Cohort, Arc<InMemoryCheckpointStore>) {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let cohort = Cohort::builder()
            .group(group)
            .store(store.clone())
            .listener(Arc::new(EventLog::new()))
            .build()
            .unwrap();
        (cohort, store)
    }

    #[test]
    fn test_run_without_fault_completes() {
        let (cohort, store) = in_memory(GroupConfig {
            fault: None,
            ..GroupConfig::default()
        });

        let report = cohort.run().unwrap();
        assert!(report.all_completed());
        assert_eq!(store.len(), 3);
        for summary in report.summaries() {
            assert_eq!(summary.final_iteration, 10);
            assert_eq!(summary.checkpoints, vec![3, 6, 9]);
        }
    }

    #[test]
    fn test_inspect_and_reset() {
        let (cohort, store) = in_memory(GroupConfig {
            fault: None,
            ..GroupConfig::default()
        });
        assert!(cohort
            .inspect()
            .iter()
            .all(|(_, s)| matches!(s, CheckpointStatus::Missing)));

        cohort.run().unwrap();
        store.insert_raw(ParticipantId(2), "garbage");

        let statuses = cohort.inspect();
        assert!(matches!(
            &statuses[0].1,
            CheckpointStatus::Valid(record) if record.iteration == 9
        ));
        assert!(matches!(statuses[2].1, CheckpointStatus::Unusable(_)));

        assert_eq!(cohort.reset().unwrap(), 3);
        assert!(store.is_empty());
        assert_eq!(cohort.reset().unwrap(), 0);
    }

    #[test]
    fn test_panicking_rule_is_reported() {
        struct Explodes;
        impl UpdateRule for Explodes {
            fn advance(&self, participant: ParticipantId, _position: usize, value: i64) -> i64 {
                assert!(participant.0 != 2, "boom");
                value
            }
        }

        let cohort = Cohort::builder()
            .group(GroupConfig {
                fault: None,
                ..GroupConfig::default()
            })
            .store(Arc::new(InMemoryCheckpointStore::new()))
            .update_rule(Arc::new(Explodes))
            .listener(Arc::new(EventLog::new()))
            .build()
            .unwrap();

        let err = cohort.run().unwrap_err();
        assert!(matches!(
            err,
            CohortError::ParticipantPanicked(ParticipantId(2))
        ));
    }
}
