//! # Cohort
//!
//! Coordinated checkpointing with rollback recovery for a fixed-size group
//! of participants running an iterative computation.
//!
//! Every participant advances its own state; every `checkpoint_interval`
//! iterations the group meets at a barrier and then each participant
//! persists its state. On restart each participant resumes from its own
//! latest checkpoint instead of starting over.
//!
//! ```rust,ignore
//! let report = Cohort::builder()
//!     .checkpoint_dir("checkpoints")
//!     .build()?
//!     .run()?;
//! if report.any_faulted() {
//!     // run again to recover
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;
pub mod config;
pub mod error;
pub mod group;
pub mod report;

pub use builder::CohortBuilder;
pub use config::{CohortConfig, DEFAULT_CHECKPOINT_DIR};
pub use error::CohortError;
pub use group::{CheckpointStatus, Cohort};
pub use report::GroupReport;

pub use cohort_core::{
    EventLog, FaultTrigger, GroupConfig, ParticipantEvent, ParticipantListener, RankIncrement,
    RunSummary, StartKind, StartupError, Termination, TracingListener, UpdateRule,
};
pub use cohort_storage::{
    CheckpointRecord, CheckpointStore, FileSystemCheckpointStore, InMemoryCheckpointStore,
    ParticipantId, StoreError,
};
