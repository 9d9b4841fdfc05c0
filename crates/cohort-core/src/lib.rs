//! # Cohort Core
//!
//! Coordination layer for Cohort: the group barrier that gates every
//! checkpoint boundary, the per-participant state machine that decides
//! between fresh start and recovery, and the event hook used for progress
//! output and testing.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod barrier;
pub mod config;
pub mod error;
pub mod events;
pub mod participant;

pub use barrier::{BarrierMember, BarrierStats, GroupBarrier, SyncOutcome};
pub use config::{FaultTrigger, GroupConfig};
pub use error::StartupError;
pub use events::{EventLog, ParticipantEvent, ParticipantListener, StartKind, TracingListener};
pub use participant::update::{RankIncrement, UpdateRule};
pub use participant::{
    LocalState, Participant, ParticipantContext, ParticipantPhase, RunSummary, Termination,
};
