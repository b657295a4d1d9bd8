//! Shared state of one round-robin run.

use core::fmt;
use core::num::NonZeroUsize;
use core::ops::Deref;

use crate::stats::Stats;
use crate::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// Marks a transition slot nobody has claimed yet.
const UNRECORDED: usize = usize::MAX;

// Align to cache size (Intel) so the hot counter and the termination flag do not share a line.
#[repr(align(64))]
#[derive(Debug)]
struct CacheLine<T>(T);

impl<T> Deref for CacheLine<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Outcome of a single [`CounterState::try_advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvanceResult {
    /// The counter moved forward by exactly one on behalf of the caller.
    Advanced,
    /// The counter belongs to another worker right now; nothing changed.
    NotMyTurn,
    /// The counter has passed the target; the run is over.
    Done,
}

/// The counter, its target and the termination flag shared by every worker of a run.
///
/// `value` only ever grows by one per successful [`try_advance`](CounterState::try_advance), and
/// `finished` only ever goes from `false` to `true`. Once `value` exceeds `target` no further
/// advance is possible, so the final value of a completed run is always `target + 1`.
pub struct CounterState {
    value: CacheLine<AtomicUsize>,
    finished: CacheLine<AtomicBool>,
    target: usize,
    total_workers: usize,
    // `transitions[v]` is the index of the worker that moved the counter from `v` to `v + 1`.
    transitions: Option<Box<[AtomicUsize]>>,
    stats: Stats,
}

impl CounterState {
    /// Creates the state for `total_workers` workers counting up past `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::num::NonZeroUsize;
    /// use round_robin_counter::state::{AdvanceResult, CounterState};
    ///
    /// let workers = NonZeroUsize::new(2).unwrap();
    /// let state = CounterState::new(workers, 1);
    ///
    /// assert!(state.is_my_turn(0));
    /// assert_eq!(state.try_advance(1), AdvanceResult::NotMyTurn);
    /// assert_eq!(state.try_advance(0), AdvanceResult::Advanced);
    /// assert_eq!(state.try_advance(1), AdvanceResult::Advanced);
    /// assert_eq!(state.try_advance(0), AdvanceResult::Done);
    /// assert_eq!(state.value(), 2);
    /// ```
    pub fn new(total_workers: NonZeroUsize, target: usize) -> Self {
        CounterState {
            value: CacheLine(AtomicUsize::new(0)),
            finished: CacheLine(AtomicBool::new(false)),
            target,
            total_workers: total_workers.get(),
            transitions: None,
            stats: Stats::new(),
        }
    }

    /// Like [`new`](CounterState::new), additionally remembering which worker performed every
    /// transition.
    ///
    /// This allocates one slot per value in `0..=target`.
    pub fn with_transition_log(total_workers: NonZeroUsize, target: usize) -> Self {
        let transitions = (0..=target)
            .map(|_| AtomicUsize::new(UNRECORDED))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        CounterState {
            transitions: Some(transitions),
            ..CounterState::new(total_workers, target)
        }
    }

    /// Returns true iff the counter currently belongs to worker `index`.
    ///
    /// This is an unsynchronized peek; the answer may be stale by the time the caller acts on it.
    #[inline]
    pub fn is_my_turn(&self, index: usize) -> bool {
        self.value.load(Ordering::Relaxed) % self.total_workers == index
    }

    /// Returns true once any worker has observed the counter past the target.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Sets the termination flag. Returns true only for the call that flipped it.
    pub fn finish(&self) -> bool {
        !self.finished.swap(true, Ordering::AcqRel)
    }

    /// Attempts to move the counter forward on behalf of worker `index`.
    ///
    /// This is the only place the counter is ever written. Callers that share a lock get
    /// atomicity from it; lock-free callers get it from the compare-and-swap below, which re-reads
    /// and re-checks the whole condition whenever it loses (spurious failures included).
    pub fn try_advance(&self, index: usize) -> AdvanceResult {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            if current > self.target {
                self.finish();
                return AdvanceResult::Done;
            }

            if current % self.total_workers != index {
                return AdvanceResult::NotMyTurn;
            }

            match self.value.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    if let Some(transitions) = &self.transitions {
                        transitions[current].store(index, Ordering::Relaxed);
                    }
                    return AdvanceResult::Advanced;
                }
                Err(observed) => {
                    self.stats.record_cas_retry();
                    current = observed;
                }
            }
        }
    }

    /// Current counter value.
    pub fn value(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }

    /// The value the counter has to exceed for the run to finish.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Number of workers taking turns.
    pub fn total_workers(&self) -> usize {
        self.total_workers
    }

    /// Contention counters of this run.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns the recorded transitions, `None` if recording was not requested.
    ///
    /// Entry `v` holds the index of the worker that moved the counter from `v` to `v + 1`, or
    /// `None` if that transition has not happened yet.
    pub fn transitions(&self) -> Option<Vec<Option<usize>>> {
        self.transitions.as_ref().map(|transitions| {
            transitions
                .iter()
                .map(|slot| match slot.load(Ordering::Relaxed) {
                    UNRECORDED => None,
                    index => Some(index),
                })
                .collect()
        })
    }
}

impl fmt::Debug for CounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterState")
            .field("value", &self.value.load(Ordering::Relaxed))
            .field("target", &self.target)
            .field("finished", &self.finished.load(Ordering::Relaxed))
            .field("total_workers", &self.total_workers)
            .field("records_transitions", &self.transitions.is_some())
            .finish()
    }
}
