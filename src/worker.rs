//! Per-thread control loop.
//!
//! A worker does nothing but ask the strategy for its turn over and over until it sees the run
//! finish. It keeps no state of its own beyond its index and a private tally of polls and advances;
//! nothing shared is written while it waits.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::state::{AdvanceResult, CounterState};
use crate::strategy::TurnStrategy;
use crate::sync::spin_loop;

/// Where a worker is in its control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting for its turn.
    Polling,
    /// Its last attempt moved the counter.
    Advancing,
    /// Observed the end of the run; the loop is over.
    Terminated,
}

/// What one worker did during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Index of the worker.
    pub index: usize,
    /// Number of times this worker moved the counter.
    pub advances: usize,
    /// Number of times this worker asked its strategy for a turn.
    pub polls: usize,
}

impl WorkerReport {
    /// An empty tally for worker `index`.
    pub fn new(index: usize) -> Self {
        WorkerReport {
            index,
            advances: 0,
            polls: 0,
        }
    }
}

/// One of the workers taking turns on a [`CounterState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    index: usize,
    total_workers: usize,
    max_value: usize,
}

impl Worker {
    /// Describes worker `index` of the run driven by `state`.
    pub fn new(index: usize, state: &CounterState) -> Self {
        debug_assert!(index < state.total_workers());

        Worker {
            index,
            total_workers: state.total_workers(),
            max_value: state.target(),
        }
    }

    /// Index of this worker; it advances the counter from every value `v` with
    /// `v % total_workers == index`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of workers in the run.
    pub fn total_workers(&self) -> usize {
        self.total_workers
    }

    /// The target the counter has to exceed.
    pub fn max_value(&self) -> usize {
        self.max_value
    }

    /// Runs one iteration of the control loop.
    ///
    /// Every call that reaches the strategy counts as a poll in `tally`, and one that moved the
    /// counter also counts as an advance. Busy-waiting strategies come back with
    /// [`WorkerState::Polling`] immediately when it is not this worker's turn; the loop spins on
    /// them without any added delay.
    pub fn step<S>(
        &self,
        phase: WorkerState,
        state: &CounterState,
        strategy: &S,
        tally: &mut WorkerReport,
    ) -> WorkerState
    where
        S: TurnStrategy + ?Sized,
    {
        if phase == WorkerState::Terminated || state.is_finished() {
            return WorkerState::Terminated;
        }

        tally.polls += 1;
        match strategy.advance(state, self.index) {
            AdvanceResult::Advanced => {
                tally.advances += 1;
                trace!(index = self.index, advances = tally.advances, "advanced");
                WorkerState::Advancing
            }
            AdvanceResult::NotMyTurn => {
                spin_loop();
                WorkerState::Polling
            }
            AdvanceResult::Done => WorkerState::Terminated,
        }
    }

    /// Loops until the run is finished and reports what this worker did.
    pub fn run<S>(&self, state: &CounterState, strategy: &S) -> WorkerReport
    where
        S: TurnStrategy + ?Sized,
    {
        let mut phase = WorkerState::Polling;
        let mut tally = WorkerReport::new(self.index);
        while phase != WorkerState::Terminated {
            phase = self.step(phase, state, strategy, &mut tally);
        }

        debug!(
            index = self.index,
            advances = tally.advances,
            polls = tally.polls,
            "worker terminated"
        );
        tally
    }
}
