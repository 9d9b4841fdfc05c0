//! Participant state machine.
//!
//! ## Lifecycle
//!
//! ```text
//!            load ok                     boundary
//!   start ───────────────► Running ───────────────► AtBoundary
//!     │                     ▲  │  ◄───────────────     │
//!     │ none / corrupt      │  │     sync + save       │
//!     ▼                     │  │                       │
//!   FreshStart ─────────────┘  ├─ max reached ─► Terminated(Normal)
//!                              └─ fault ───────► Terminated(Faulted)
//! ```
//!
//! 1. `store.load()` → `Option<CheckpointRecord>`
//! 2. A record with the configured vector length resumes the participant
//!    exactly where it was saved; anything else starts fresh
//! 3. Each iteration updates every element, then bumps the counter
//! 4. An injected fault ends the participant on the spot: no checkpoint
//!    for that iteration, no final save. The fault is only armed in a
//!    fresh incarnation; a recovered participant replays past it
//! 5. At a boundary the participant waits for the group, then saves. A
//!    failed save is reported and the loop continues

pub mod update;

use std::sync::Arc;

use cohort_storage::{ParticipantId, ParticipantStorage};
use tracing::{debug, trace, warn};

use crate::barrier::BarrierMember;
use crate::config::GroupConfig;
use crate::events::{ParticipantEvent, ParticipantListener, StartKind};
use update::{initial_data, UpdateRule};

/// How a participant ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Reached the final iteration.
    Normal,
    /// Stopped by the injected fault.
    Faulted,
}

/// Phase of the participant state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantPhase {
    /// No usable checkpoint was found; state is being initialized.
    FreshStart,
    /// Advancing iterations.
    Running,
    /// At a checkpoint boundary, about to synchronize and save.
    AtBoundary,
    /// Done.
    Terminated(Termination),
}

/// Iteration counter and data vector, always changed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalState {
    iteration: u64,
    data: Vec<i64>,
}

impl LocalState {
    /// State at `iteration` holding `data`.
    #[must_use]
    pub fn new(iteration: u64, data: Vec<i64>) -> Self {
        Self { iteration, data }
    }

    /// Iterations completed so far.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current data vector.
    #[must_use]
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    /// Apply one iteration of `rule` and bump the counter.
    pub fn advance(&mut self, rule: &dyn UpdateRule, participant: ParticipantId) {
        for (position, value) in self.data.iter_mut().enumerate() {
            *value = rule.advance(participant, position, *value);
        }
        self.iteration += 1;
    }
}

/// Everything a participant needs, injected by the launcher.
pub struct ParticipantContext {
    /// Group-wide configuration.
    pub config: Arc<GroupConfig>,
    /// Storage handle scoped to this participant.
    pub storage: ParticipantStorage,
    /// This participant's barrier membership.
    pub barrier: BarrierMember,
    /// Initialization and update rule.
    pub rule: Arc<dyn UpdateRule>,
    /// Event sink.
    pub listener: Arc<dyn ParticipantListener>,
}

/// What a participant did over one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Who ran.
    pub participant: ParticipantId,
    /// Fresh start or recovery.
    pub start: StartKind,
    /// Iteration the run started from.
    pub resumed_from: u64,
    /// Last completed iteration.
    pub final_iteration: u64,
    /// How the run ended.
    pub termination: Termination,
    /// Iterations that were checkpointed successfully.
    pub checkpoints: Vec<u64>,
    /// Iterations whose checkpoint save failed.
    pub failed_checkpoints: Vec<u64>,
}

impl RunSummary {
    /// Whether the run ended with the injected fault.
    #[must_use]
    pub fn faulted(&self) -> bool {
        self.termination == Termination::Faulted
    }
}

/// One member of the group, driving its own iterate → checkpoint loop.
pub struct Participant {
    id: ParticipantId,
    config: Arc<GroupConfig>,
    storage: ParticipantStorage,
    barrier: BarrierMember,
    rule: Arc<dyn UpdateRule>,
    listener: Arc<dyn ParticipantListener>,
    phase: ParticipantPhase,
    state: LocalState,
    start: StartKind,
    resumed_from: u64,
    checkpoints: Vec<u64>,
    failed_checkpoints: Vec<u64>,
}

impl Participant {
    /// Run the startup transition: resume from the stored checkpoint if it
    /// is usable, otherwise initialize fresh state. Ends in `Running`.
    ///
    /// Load failures never escape: a missing, unreadable, corrupt or
    /// wrongly sized record all lead to a fresh start.
    #[must_use]
    pub fn start(ctx: ParticipantContext) -> Self {
        let ParticipantContext {
            config,
            storage,
            barrier,
            rule,
            listener,
        } = ctx;
        let id = storage.owner();
        debug_assert_eq!(id, barrier.participant(), "storage and barrier owners differ");

        let recovered = storage.load_or_none().filter(|record| {
            if record.data.len() == config.data_len {
                true
            } else {
                warn!(
                    participant = %id,
                    expected = config.data_len,
                    found = record.data.len(),
                    "checkpoint has wrong vector length, starting fresh"
                );
                false
            }
        });

        let mut participant = Self {
            id,
            config,
            storage,
            barrier,
            rule,
            listener,
            phase: ParticipantPhase::FreshStart,
            state: LocalState::new(0, Vec::new()),
            start: StartKind::Fresh,
            resumed_from: 0,
            checkpoints: Vec::new(),
            failed_checkpoints: Vec::new(),
        };

        match recovered {
            Some(record) => {
                participant.state = LocalState::new(record.iteration, record.data);
                participant.start = StartKind::Recovered;
            }
            None => {
                let data = initial_data(participant.rule.as_ref(), id, participant.config.data_len);
                participant.state = LocalState::new(0, data);
            }
        }
        participant.resumed_from = participant.state.iteration();
        participant.transition(ParticipantPhase::Running);
        participant.emit(ParticipantEvent::Started {
            participant: id,
            kind: participant.start,
            iteration: participant.state.iteration(),
            data: participant.state.data().to_vec(),
        });
        participant
    }

    /// This participant's identity.
    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ParticipantPhase {
        self.phase
    }

    /// Current local state.
    #[must_use]
    pub fn state(&self) -> &LocalState {
        &self.state
    }

    /// How startup obtained the state.
    #[must_use]
    pub fn start_kind(&self) -> StartKind {
        self.start
    }

    /// Drive the state machine until it terminates.
    ///
    /// Consumes the participant; its barrier membership is released when
    /// this returns, whichever way the run ended.
    pub fn run(mut self) -> RunSummary {
        loop {
            match self.phase {
                ParticipantPhase::FreshStart => self.transition(ParticipantPhase::Running),
                ParticipantPhase::Running => self.step(),
                ParticipantPhase::AtBoundary => {
                    self.checkpoint();
                    self.transition(ParticipantPhase::Running);
                }
                ParticipantPhase::Terminated(termination) => {
                    return RunSummary {
                        participant: self.id,
                        start: self.start,
                        resumed_from: self.resumed_from,
                        final_iteration: self.state.iteration(),
                        termination,
                        checkpoints: std::mem::take(&mut self.checkpoints),
                        failed_checkpoints: std::mem::take(&mut self.failed_checkpoints),
                    };
                }
            }
        }
    }

    /// One pass through `Running`.
    fn step(&mut self) {
        let id = self.id;
        if self.state.iteration() >= self.config.max_iterations {
            self.transition(ParticipantPhase::Terminated(Termination::Normal));
            self.emit(ParticipantEvent::Finished {
                participant: id,
                iteration: self.state.iteration(),
            });
            return;
        }

        self.state.advance(self.rule.as_ref(), id);
        let iteration = self.state.iteration();
        self.emit(ParticipantEvent::Advanced {
            participant: id,
            iteration,
            data: self.state.data().to_vec(),
        });

        if self.start == StartKind::Fresh && self.config.faults_at(id, iteration) {
            self.emit(ParticipantEvent::Faulted {
                participant: id,
                iteration,
            });
            self.transition(ParticipantPhase::Terminated(Termination::Faulted));
            return;
        }

        if self.config.is_checkpoint_boundary(iteration) {
            self.transition(ParticipantPhase::AtBoundary);
        }

        if !self.config.step_delay.is_zero() {
            std::thread::sleep(self.config.step_delay);
        }
    }

    /// Synchronize with the group, then persist the current state.
    fn checkpoint(&mut self) {
        let id = self.id;
        let iteration = self.state.iteration();

        self.emit(ParticipantEvent::BarrierArrived {
            participant: id,
            iteration,
        });
        let outcome = self.barrier.sync(iteration);
        self.emit(ParticipantEvent::BarrierReleased {
            participant: id,
            iteration,
            generation: outcome.generation,
        });

        match self.storage.save(iteration, self.state.data()) {
            Ok(_) => {
                self.checkpoints.push(iteration);
                self.emit(ParticipantEvent::CheckpointSaved {
                    participant: id,
                    iteration,
                });
            }
            Err(e) => {
                self.failed_checkpoints.push(iteration);
                self.emit(ParticipantEvent::CheckpointFailed {
                    participant: id,
                    iteration,
                    error: e.to_string(),
                });
            }
        }
    }

    fn transition(&mut self, next: ParticipantPhase) {
        trace!(participant = %self.id, from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }

    fn emit(&self, event: ParticipantEvent) {
        self.listener.on_event(&event);
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl Drop for Participant {
    fn drop(&mut self) {
        debug!(participant = %self.id, phase = ?self.phase, "participant dropped");
    }
}
