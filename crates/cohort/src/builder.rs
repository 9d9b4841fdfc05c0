//! Fluent builder for [`Cohort`] construction.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cohort_core::{
    FaultTrigger, GroupConfig, ParticipantListener, RankIncrement, TracingListener, UpdateRule,
};
use cohort_storage::{CheckpointStore, FileSystemCheckpointStore};

use crate::config::CohortConfig;
use crate::error::CohortError;
use crate::group::Cohort;

/// Fluent builder for constructing a [`Cohort`].
///
/// # Example
///
/// ```rust,ignore
/// let cohort = Cohort::builder()
///     .group_size(4)
///     .checkpoint_interval(5)
///     .checkpoint_dir("/var/lib/cohort")
///     .no_fault()
///     .build()?;
/// let report = cohort.run()?;
/// ```
pub struct CohortBuilder {
    config: CohortConfig,
    store: Option<Arc<dyn CheckpointStore>>,
    rule: Option<Arc<dyn UpdateRule>>,
    listener: Option<Arc<dyn ParticipantListener>>,
}

impl CohortBuilder {
    /// Create a builder for the reference scenario.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CohortConfig::default(),
            store: None,
            rule: None,
            listener: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: CohortConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the group parameters.
    #[must_use]
    pub fn group(mut self, group: GroupConfig) -> Self {
        self.config.group = group;
        self
    }

    /// Set the number of participants.
    #[must_use]
    pub fn group_size(mut self, size: u32) -> Self {
        self.config.group.group_size = size;
        self
    }

    /// Set the smallest accepted group.
    #[must_use]
    pub fn min_group_size(mut self, size: u32) -> Self {
        self.config.group.min_group_size = size;
        self
    }

    /// Set the data vector length.
    #[must_use]
    pub fn data_len(mut self, len: usize) -> Self {
        self.config.group.data_len = len;
        self
    }

    /// Checkpoint every `interval` iterations.
    #[must_use]
    pub fn checkpoint_interval(mut self, interval: u64) -> Self {
        self.config.group.checkpoint_interval = interval;
        self
    }

    /// Set the iteration at which participants finish.
    #[must_use]
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.config.group.max_iterations = max;
        self
    }

    /// Inject a crash.
    #[must_use]
    pub fn fault(mut self, fault: FaultTrigger) -> Self {
        self.config.group.fault = Some(fault);
        self
    }

    /// Run without an injected crash.
    #[must_use]
    pub fn no_fault(mut self) -> Self {
        self.config.group.fault = None;
        self
    }

    /// Pause after every iteration.
    #[must_use]
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.config.group.step_delay = delay;
        self
    }

    /// Set the directory for checkpoint files.
    #[must_use]
    pub fn checkpoint_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.checkpoint_dir = path.into();
        self
    }

    /// Use a custom checkpoint store instead of the filesystem one.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom initialization and update rule.
    ///
    /// Defaults to [`RankIncrement`].
    #[must_use]
    pub fn update_rule(mut self, rule: Arc<dyn UpdateRule>) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Receive participant events.
    ///
    /// Defaults to [`TracingListener`]. To keep the progress output as
    /// well, pass a `Vec<Arc<dyn ParticipantListener>>` containing both.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn ParticipantListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Validate the configuration and build the [`Cohort`].
    ///
    /// # Errors
    ///
    /// Returns [`CohortError::Startup`] if the group parameters are
    /// rejected, most notably when the group is below its minimum size.
    pub fn build(self) -> Result<Cohort, CohortError> {
        self.config.group.validate()?;

        let store = self.store.unwrap_or_else(|| {
            Arc::new(FileSystemCheckpointStore::new(
                self.config.checkpoint_dir.clone(),
            ))
        });
        let rule = self.rule.unwrap_or_else(|| Arc::new(RankIncrement));
        let listener = self.listener.unwrap_or_else(|| Arc::new(TracingListener));

        Ok(Cohort::from_parts(self.config, store, rule, listener))
    }
}

impl Default for CohortBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CohortBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohortBuilder")
            .field("config", &self.config)
            .field("custom_store", &self.store.is_some())
            .field("custom_rule", &self.rule.is_some())
            .field("custom_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::StartupError;
    use cohort_storage::ParticipantId;

    #[test]
    fn test_default_builder() {
        let cohort = CohortBuilder::new().build().unwrap();
        assert_eq!(cohort.config(), &CohortConfig::default());
    }

    #[test]
    fn test_builder_with_options() {
        let cohort = Cohort::builder()
            .group_size(5)
            .min_group_size(2)
            .data_len(8)
            .checkpoint_interval(4)
            .max_iterations(20)
            .fault(FaultTrigger::new(ParticipantId(4), 7))
            .step_delay(Duration::from_millis(1))
            .checkpoint_dir("/tmp/cohort-test")
            .build()
            .unwrap();

        let group = cohort.group();
        assert_eq!(group.group_size, 5);
        assert_eq!(group.min_group_size, 2);
        assert_eq!(group.data_len, 8);
        assert_eq!(group.checkpoint_interval, 4);
        assert_eq!(group.max_iterations, 20);
        assert_eq!(group.fault, Some(FaultTrigger::new(ParticipantId(4), 7)));
        assert_eq!(group.step_delay, Duration::from_millis(1));
        assert_eq!(
            cohort.config().checkpoint_dir,
            PathBuf::from("/tmp/cohort-test")
        );
    }

    #[test]
    fn test_builder_rejects_small_group() {
        let err = Cohort::builder().group_size(2).build().unwrap_err();
        assert!(err.is_startup());
        assert!(matches!(
            err,
            CohortError::Startup(StartupError::GroupTooSmall {
                actual: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn test_no_fault_clears_trigger() {
        let cohort = Cohort::builder().no_fault().build().unwrap();
        assert_eq!(cohort.group().fault, None);
    }

    #[test]
    fn test_debug_hides_trait_objects() {
        let builder = Cohort::builder().store(Arc::new(
            cohort_storage::InMemoryCheckpointStore::new(),
        ));
        let rendered = format!("{builder:?}");
        assert!(rendered.contains("custom_store: true"));
        assert!(rendered.contains("custom_listener: false"));
    }
}
