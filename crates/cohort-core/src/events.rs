//! Participant lifecycle events.
//!
//! Every observable step of a participant is reported to a
//! [`ParticipantListener`]. [`TracingListener`] turns them into the
//! human-readable progress lines; [`EventLog`] records them in global
//! arrival order so tests can check orderings across participants.

use std::sync::Arc;

use cohort_storage::ParticipantId;
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// How a participant obtained its initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    /// No usable checkpoint; state initialized from the identity.
    Fresh,
    /// State restored from the participant's checkpoint.
    Recovered,
}

/// Something a participant did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantEvent {
    /// Startup finished.
    Started {
        /// Who started.
        participant: ParticipantId,
        /// Fresh start or recovery.
        kind: StartKind,
        /// Iteration the participant resumes from.
        iteration: u64,
        /// Data vector it resumes with.
        data: Vec<i64>,
    },
    /// One iteration completed.
    Advanced {
        /// Who advanced.
        participant: ParticipantId,
        /// Iteration just completed.
        iteration: u64,
        /// Data vector after the update.
        data: Vec<i64>,
    },
    /// Arrived at the barrier for a checkpoint boundary.
    BarrierArrived {
        /// Who arrived.
        participant: ParticipantId,
        /// Boundary iteration.
        iteration: u64,
    },
    /// Released from the barrier.
    BarrierReleased {
        /// Who was released.
        participant: ParticipantId,
        /// Boundary iteration.
        iteration: u64,
        /// Barrier round.
        generation: u64,
    },
    /// Checkpoint persisted.
    CheckpointSaved {
        /// Owner of the checkpoint.
        participant: ParticipantId,
        /// Checkpointed iteration.
        iteration: u64,
    },
    /// Checkpoint save failed; the participant keeps running.
    CheckpointFailed {
        /// Owner of the checkpoint.
        participant: ParticipantId,
        /// Iteration that could not be checkpointed.
        iteration: u64,
        /// Rendered store error.
        error: String,
    },
    /// Injected crash.
    Faulted {
        /// Who crashed.
        participant: ParticipantId,
        /// Iteration at which it crashed.
        iteration: u64,
    },
    /// Reached the final iteration.
    Finished {
        /// Who finished.
        participant: ParticipantId,
        /// Final iteration.
        iteration: u64,
    },
}

impl ParticipantEvent {
    /// Participant that emitted the event.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        match self {
            Self::Started { participant, .. }
            | Self::Advanced { participant, .. }
            | Self::BarrierArrived { participant, .. }
            | Self::BarrierReleased { participant, .. }
            | Self::CheckpointSaved { participant, .. }
            | Self::CheckpointFailed { participant, .. }
            | Self::Faulted { participant, .. }
            | Self::Finished { participant, .. } => *participant,
        }
    }
}

/// Receives participant events. Called from participant threads.
pub trait ParticipantListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &ParticipantEvent);
}

impl<L: ParticipantListener + ?Sized> ParticipantListener for Arc<L> {
    fn on_event(&self, event: &ParticipantEvent) {
        (**self).on_event(event);
    }
}

impl ParticipantListener for Vec<Arc<dyn ParticipantListener>> {
    fn on_event(&self, event: &ParticipantEvent) {
        for listener in self {
            listener.on_event(event);
        }
    }
}

/// Emits one progress line per event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ParticipantListener for TracingListener {
    fn on_event(&self, event: &ParticipantEvent) {
        match event {
            ParticipantEvent::Started {
                participant,
                kind: StartKind::Fresh,
                iteration,
                data,
            } => info!(%participant, iteration, ?data, "starting from scratch"),
            ParticipantEvent::Started {
                participant,
                kind: StartKind::Recovered,
                iteration,
                data,
            } => info!(%participant, iteration, ?data, "recovering from checkpoint"),
            ParticipantEvent::Advanced {
                participant,
                iteration,
                data,
            } => info!(%participant, iteration, ?data, "iteration complete"),
            ParticipantEvent::BarrierArrived {
                participant,
                iteration,
            } => info!(%participant, iteration, "reached checkpoint interval, synchronizing"),
            ParticipantEvent::BarrierReleased {
                participant,
                iteration,
                generation,
            } => info!(
                %participant,
                iteration,
                generation,
                "synchronization complete, saving checkpoint"
            ),
            ParticipantEvent::CheckpointSaved {
                participant,
                iteration,
            } => info!(%participant, iteration, "checkpoint saved"),
            ParticipantEvent::CheckpointFailed {
                participant,
                iteration,
                error,
            } => error!(
                %participant,
                iteration,
                %error,
                "checkpoint save failed, continuing without it"
            ),
            ParticipantEvent::Faulted {
                participant,
                iteration,
            } => warn!(%participant, iteration, "simulating fault, terminating"),
            ParticipantEvent::Finished {
                participant,
                iteration,
            } => info!(%participant, iteration, "finished"),
        }
    }
}

/// Records every event in the order listeners observed them.
///
/// Events from different participants are serialized through one lock,
/// so the log order is consistent with the real-time order of the calls.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ParticipantEvent>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<ParticipantEvent> {
        self.events.lock().clone()
    }

    /// Events emitted by one participant.
    #[must_use]
    pub fn events_for(&self, participant: ParticipantId) -> Vec<ParticipantEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.participant() == participant)
            .cloned()
            .collect()
    }

    /// Iterations at which `participant` saved a checkpoint, in order.
    #[must_use]
    pub fn saved_iterations(&self, participant: ParticipantId) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ParticipantEvent::CheckpointSaved {
                    participant: p,
                    iteration,
                } if *p == participant => Some(*iteration),
                _ => None,
            })
            .collect()
    }
}

impl ParticipantListener for EventLog {
    fn on_event(&self, event: &ParticipantEvent) {
        self.events.lock().push(event.clone());
    }
}
