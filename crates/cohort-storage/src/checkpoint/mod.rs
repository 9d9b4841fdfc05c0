//! # Checkpoint Persistence
//!
//! ## Module Overview
//!
//! - [`layout`]: file naming for per-participant records
//! - [`store`]: the [`CheckpointStore`](store::CheckpointStore) trait and
//!   the filesystem implementation with atomic replace
//! - [`memory`]: in-memory store for tests and benchmarks
//! - [`handle`]: the per-participant handle injected at startup

pub mod handle;
pub mod layout;
pub mod memory;
pub mod store;
