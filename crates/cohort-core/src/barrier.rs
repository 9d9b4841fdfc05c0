//! Group barrier gating every checkpoint boundary.
//!
//! ## Protocol
//!
//! 1. The launcher creates one [`BarrierMember`] per participant with
//!    [`GroupBarrier::with_members`]; the live set starts at the group size
//! 2. A participant at a checkpoint boundary calls [`BarrierMember::sync`]
//! 3. The call blocks until every live member has arrived, then all of
//!    them are released together and the generation advances
//! 4. Dropping a member (normal exit, injected crash, panic) removes it
//!    from the live set; if everyone still live is already waiting, the
//!    round is released
//!
//! Generations stop a member released from round `g` from being counted
//! as an arrival of round `g` again when it comes back for round `g + 1`
//! before slower peers have woken up.
//!
//! There is no timeout: a live member that never arrives blocks its peers
//! indefinitely.

use std::fmt;
use std::sync::Arc;

use cohort_storage::ParticipantId;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

#[derive(Debug)]
struct BarrierState {
    /// Members that have not departed.
    live: usize,
    /// Members waiting in the current round.
    arrived: usize,
    /// Completed rounds.
    generation: u64,
    /// How many members the last completed round released.
    last_released: usize,
}

impl BarrierState {
    fn release(&mut self) -> usize {
        let released = self.arrived;
        self.arrived = 0;
        self.generation += 1;
        self.last_released = released;
        released
    }
}

/// Snapshot of the barrier's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierStats {
    /// Fixed group size agreed at startup.
    pub size: usize,
    /// Members still live.
    pub live: usize,
    /// Members waiting in the current round.
    pub arrived: usize,
    /// Completed rounds.
    pub generation: u64,
}

/// Result of a completed [`BarrierMember::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Generation number of the round this call belonged to.
    pub generation: u64,
    /// Whether this caller's arrival completed the round.
    pub leader: bool,
    /// Number of members the round released.
    pub released: usize,
}

/// Rendezvous point for a fixed-size group.
pub struct GroupBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl GroupBarrier {
    /// Create a barrier for `size` participants and one member handle per
    /// rank, in rank order.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0 or does not fit in a `u32` rank.
    #[must_use]
    pub fn with_members(size: usize) -> Vec<BarrierMember> {
        assert!(size > 0, "barrier size must be > 0");
        let ranks = u32::try_from(size).expect("barrier size must fit in a u32 rank");

        let barrier = Arc::new(Self {
            size,
            state: Mutex::new(BarrierState {
                live: size,
                arrived: 0,
                generation: 0,
                last_released: 0,
            }),
            released: Condvar::new(),
        });

        (0..ranks)
            .map(|rank| BarrierMember {
                participant: ParticipantId(rank),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    /// Fixed group size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> BarrierStats {
        let state = self.state.lock();
        BarrierStats {
            size: self.size,
            live: state.live,
            arrived: state.arrived,
            generation: state.generation,
        }
    }

    fn arrive_and_wait(&self, participant: ParticipantId, iteration: u64) -> SyncOutcome {
        let mut state = self.state.lock();
        state.arrived += 1;
        let generation = state.generation;
        trace!(
            %participant,
            iteration,
            generation,
            arrived = state.arrived,
            live = state.live,
            "arrived at barrier"
        );

        if state.arrived >= state.live {
            let released = state.release();
            self.released.notify_all();
            debug!(generation, released, "barrier round complete");
            return SyncOutcome {
                generation,
                leader: true,
                released,
            };
        }

        while state.generation == generation {
            self.released.wait(&mut state);
        }

        SyncOutcome {
            generation,
            leader: false,
            released: state.last_released,
        }
    }

    fn depart(&self, participant: ParticipantId) {
        let mut state = self.state.lock();
        state.live = state.live.saturating_sub(1);
        debug!(%participant, live = state.live, "member left barrier");

        if state.arrived > 0 && state.arrived >= state.live {
            let generation = state.generation;
            let released = state.release();
            self.released.notify_all();
            debug!(generation, released, "barrier round released by departure");
        }
    }
}

impl fmt::Debug for GroupBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupBarrier")
            .field("stats", &self.stats())
            .finish()
    }
}

/// One participant's membership in a [`GroupBarrier`].
///
/// Dropping the handle removes the participant from the live set.
pub struct BarrierMember {
    participant: ParticipantId,
    barrier: Arc<GroupBarrier>,
}

impl BarrierMember {
    /// Participant owning this membership.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// The shared barrier.
    #[must_use]
    pub fn barrier(&self) -> &Arc<GroupBarrier> {
        &self.barrier
    }

    /// Block until every live member has called `sync`, then return.
    ///
    /// `iteration` is the boundary being synchronized and is only used
    /// for diagnostics.
    #[must_use = "the outcome tells which round was completed"]
    pub fn sync(&self, iteration: u64) -> SyncOutcome {
        self.barrier.arrive_and_wait(self.participant, iteration)
    }
}

impl Drop for BarrierMember {
    fn drop(&mut self) {
        self.barrier.depart(self.participant);
    }
}

impl fmt::Debug for BarrierMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarrierMember")
            .field("participant", &self.participant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_single_member_never_blocks() {
        let mut members = GroupBarrier::with_members(1);
        let member = members.pop().unwrap();

        let first = member.sync(3);
        let second = member.sync(6);
        assert!(first.leader);
        assert_eq!(first.generation, 0);
        assert_eq!(second.generation, 1);
        assert_eq!(second.released, 1);
    }

    #[test]
    fn test_members_in_rank_order() {
        let members = GroupBarrier::with_members(3);
        let ranks: Vec<u32> = members.iter().map(|m| m.participant().0).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(members[0].barrier().stats().live, 3);
    }

    #[test]
    fn test_no_member_passes_before_all_arrive() {
        let members = GroupBarrier::with_members(3);
        let barrier = Arc::clone(members[0].barrier());
        let passed = Arc::new(AtomicUsize::new(0));

        let mut members = members.into_iter();
        let last = members.next().unwrap();
        let handles: Vec<_> = members
            .map(|member| {
                let passed = Arc::clone(&passed);
                thread::spawn(move || {
                    let outcome = member.sync(3);
                    passed.fetch_add(1, Ordering::SeqCst);
                    outcome
                })
            })
            .collect();

        while barrier.stats().arrived < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(20));
        assert_eq!(passed.load(Ordering::SeqCst), 0);

        let outcome = last.sync(3);
        assert!(outcome.leader);
        assert_eq!(outcome.released, 3);

        for handle in handles {
            let outcome = handle.join().unwrap();
            assert!(!outcome.leader);
            assert_eq!(outcome.generation, 0);
            assert_eq!(outcome.released, 3);
        }
        assert_eq!(passed.load(Ordering::SeqCst), 2);
        assert_eq!(barrier.stats().generation, 1);
    }

    #[test]
    fn test_repeated_rounds_stay_in_lockstep() {
        let members = GroupBarrier::with_members(4);
        let barrier = Arc::clone(members[0].barrier());

        let handles: Vec<_> = members
            .into_iter()
            .map(|member| {
                thread::spawn(move || {
                    (1..=50)
                        .map(|round| member.sync(round).generation)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            let generations = handle.join().unwrap();
            assert_eq!(generations, (0..50).collect::<Vec<u64>>());
        }
        assert_eq!(barrier.stats().generation, 50);
        assert_eq!(barrier.stats().live, 0);
    }

    #[test]
    fn test_departure_releases_waiting_members() {
        let mut members = GroupBarrier::with_members(3);
        let quitter = members.remove(1);
        let barrier = Arc::clone(quitter.barrier());

        let handles: Vec<_> = members
            .into_iter()
            .map(|member| thread::spawn(move || member.sync(6)))
            .collect();

        while barrier.stats().arrived < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        drop(quitter);

        for handle in handles {
            let outcome = handle.join().unwrap();
            assert_eq!(outcome.generation, 0);
            assert_eq!(outcome.released, 2);
        }
    }

    #[test]
    fn test_departure_before_arrival_shrinks_live_set() {
        let mut members = GroupBarrier::with_members(3);
        drop(members.remove(1));

        let barrier = Arc::clone(members[0].barrier());
        assert_eq!(barrier.stats().live, 2);

        let b = members.pop().unwrap();
        let a = members.pop().unwrap();
        let waiter = thread::spawn(move || a.sync(6));
        let outcome = b.sync(6);
        let other = waiter.join().unwrap();

        assert_eq!(outcome.released, 2);
        assert_eq!(other.released, 2);
        assert!(outcome.leader != other.leader);
    }

    #[test]
    fn test_lone_survivor_passes_alone() {
        let mut members = GroupBarrier::with_members(3);
        let survivor = members.remove(1);
        drop(members);

        let outcome = survivor.sync(6);
        assert!(outcome.leader);
        assert_eq!(outcome.released, 1);
    }

    #[test]
    #[should_panic(expected = "barrier size must be > 0")]
    fn test_zero_size_panics() {
        let _ = GroupBarrier::with_members(0);
    }
}
