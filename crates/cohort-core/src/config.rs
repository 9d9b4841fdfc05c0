//! Group configuration.
//!
//! The defaults are the reference scenario: three participants, a data
//! vector of five values, a checkpoint every three iterations, ten
//! iterations in total, and participant 1 crashing at iteration 5.

use std::time::Duration;

use cohort_storage::ParticipantId;

use crate::error::StartupError;

/// Injected crash: `participant` terminates abruptly right after
/// completing `iteration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultTrigger {
    /// Participant that crashes.
    pub participant: ParticipantId,
    /// Absolute iteration at which it crashes.
    pub iteration: u64,
}

impl FaultTrigger {
    /// Create a trigger.
    #[must_use]
    pub const fn new(participant: ParticipantId, iteration: u64) -> Self {
        Self {
            participant,
            iteration,
        }
    }

    /// Whether the trigger fires for `participant` at `iteration`.
    ///
    /// Keyed to the absolute iteration. Participants only consult the
    /// trigger when they started fresh, so a relaunch that recovers from a
    /// checkpoint replays through `iteration` without crashing again.
    #[must_use]
    pub fn matches(&self, participant: ParticipantId, iteration: u64) -> bool {
        self.participant == participant && self.iteration == iteration
    }
}

/// Configuration shared by every participant of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Number of participants, fixed for the lifetime of the group and
    /// identical across restarts.
    pub group_size: u32,
    /// Smallest group the protocol accepts.
    pub min_group_size: u32,
    /// Length of every participant's data vector.
    pub data_len: usize,
    /// A checkpoint boundary occurs every `checkpoint_interval` iterations.
    pub checkpoint_interval: u64,
    /// Iteration at which participants terminate normally.
    pub max_iterations: u64,
    /// Optional injected crash.
    pub fault: Option<FaultTrigger>,
    /// Pause after each iteration. Zero by default.
    pub step_delay: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_size: 3,
            min_group_size: 3,
            data_len: 5,
            checkpoint_interval: 3,
            max_iterations: 10,
            fault: Some(FaultTrigger::new(ParticipantId(1), 5)),
            step_delay: Duration::ZERO,
        }
    }
}

impl GroupConfig {
    /// Check the configuration before anything runs.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::GroupTooSmall`] if `group_size` is below
    /// `min_group_size`, and [`StartupError::InvalidConfig`] for any other
    /// out-of-range value.
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.group_size < self.min_group_size {
            return Err(StartupError::GroupTooSmall {
                actual: self.group_size,
                required: self.min_group_size,
            });
        }
        if self.group_size == 0 {
            return Err(StartupError::InvalidConfig(
                "group_size must be > 0".into(),
            ));
        }
        if self.data_len == 0 {
            return Err(StartupError::InvalidConfig("data_len must be > 0".into()));
        }
        if self.checkpoint_interval == 0 {
            return Err(StartupError::InvalidConfig(
                "checkpoint_interval must be > 0".into(),
            ));
        }
        if let Some(fault) = self.fault {
            if fault.participant.0 >= self.group_size {
                return Err(StartupError::InvalidConfig(format!(
                    "fault participant {} is outside a group of {}",
                    fault.participant, self.group_size
                )));
            }
            if fault.iteration == 0 {
                return Err(StartupError::InvalidConfig(
                    "fault iteration must be > 0".into(),
                ));
            }
        }
        Ok(())
    }

    /// Whether `iteration` is a checkpoint boundary.
    #[must_use]
    pub fn is_checkpoint_boundary(&self, iteration: u64) -> bool {
        self.checkpoint_interval != 0
            && iteration > 0
            && iteration % self.checkpoint_interval == 0
    }

    /// Whether `participant` crashes at `iteration`.
    #[must_use]
    pub fn faults_at(&self, participant: ParticipantId, iteration: u64) -> bool {
        self.fault
            .is_some_and(|fault| fault.matches(participant, iteration))
    }

    /// Every participant identity in the group, in rank order.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> {
        (0..self.group_size).map(ParticipantId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_scenario() {
        let config = GroupConfig::default();
        assert_eq!(config.group_size, 3);
        assert_eq!(config.data_len, 5);
        assert_eq!(config.checkpoint_interval, 3);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.fault, Some(FaultTrigger::new(ParticipantId(1), 5)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_group_too_small() {
        let config = GroupConfig {
            group_size: 2,
            ..GroupConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(StartupError::GroupTooSmall {
                actual: 2,
                required: 3,
            })
        );
    }

    #[test]
    fn test_larger_group_is_accepted() {
        let config = GroupConfig {
            group_size: 8,
            ..GroupConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.participants().count(), 8);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = GroupConfig {
            checkpoint_interval: 0,
            ..GroupConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StartupError::InvalidConfig(_))
        ));
        assert!(!config.is_checkpoint_boundary(3));
    }

    #[test]
    fn test_zero_data_len_rejected() {
        let config = GroupConfig {
            data_len: 0,
            ..GroupConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fault_outside_group_rejected() {
        let config = GroupConfig {
            fault: Some(FaultTrigger::new(ParticipantId(3), 5)),
            ..GroupConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_checkpoint_boundaries() {
        let config = GroupConfig::default();
        let boundaries: Vec<u64> = (0..=10)
            .filter(|&i| config.is_checkpoint_boundary(i))
            .collect();
        assert_eq!(boundaries, vec![3, 6, 9]);
    }

    #[test]
    fn test_fault_keyed_to_absolute_iteration() {
        let config = GroupConfig::default();
        assert!(config.faults_at(ParticipantId(1), 5));
        assert!(!config.faults_at(ParticipantId(1), 6));
        assert!(!config.faults_at(ParticipantId(0), 5));

        let no_fault = GroupConfig {
            fault: None,
            ..GroupConfig::default()
        };
        assert!(!no_fault.faults_at(ParticipantId(1), 5));
    }
}
