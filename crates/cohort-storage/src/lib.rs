//! # Cohort Storage
//!
//! Durability layer for Cohort: the per-participant checkpoint record, its
//! textual on-disk format, and the stores that persist it.
//!
//! Every participant owns exactly one storage location. Stores never share
//! a file or key between participants, so saves from different
//! participants need no cross-participant locking.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod checkpoint;
pub mod error;
pub mod record;

pub use checkpoint::handle::ParticipantStorage;
pub use checkpoint::layout::CheckpointPaths;
pub use checkpoint::memory::InMemoryCheckpointStore;
pub use checkpoint::store::{CheckpointStore, FileSystemCheckpointStore};
pub use error::StoreError;
pub use record::{CheckpointRecord, ParticipantId, RecordParseError};
