//! Configuration for a `Cohort` group.

use std::path::PathBuf;

use cohort_core::GroupConfig;

/// Default checkpoint directory, relative to the working directory.
pub const DEFAULT_CHECKPOINT_DIR: &str = "checkpoints";

/// Configuration for a [`crate::Cohort`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortConfig {
    /// Protocol parameters shared by every participant.
    pub group: GroupConfig,
    /// Directory holding one checkpoint file per participant.
    ///
    /// Ignored when a custom store is supplied to the builder.
    pub checkpoint_dir: PathBuf,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            group: GroupConfig::default(),
            checkpoint_dir: PathBuf::from(DEFAULT_CHECKPOINT_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CohortConfig::default();
        assert_eq!(config.checkpoint_dir, PathBuf::from("checkpoints"));
        assert_eq!(config.group, GroupConfig::default());
    }
}
