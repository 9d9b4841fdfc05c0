//! Startup errors.

use thiserror::Error;

/// Errors detected before any participant enters its main loop.
///
/// These are the only fatal errors in the system: the group refuses to
/// start and the launcher exits with a failure status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    /// Fewer participants than the protocol requires.
    #[error("group of {actual} participants is below the required minimum of {required}")]
    GroupTooSmall {
        /// Configured group size.
        actual: u32,
        /// Required minimum.
        required: u32,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
