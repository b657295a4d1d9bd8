//! Builds the shared state of a run, starts one thread per worker and joins them.

use core::fmt;
use std::mem;
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::affinity::{self, AffinityBinder};
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::state::CounterState;
use crate::stats::StatsSnapshot;
use crate::strategy::{Strategy, StrategyKind, TurnStrategy};
use crate::sync::{self, JoinHandle};
use crate::worker::{Worker, WorkerReport};

// Everything the workers of one run share. Dropped only once the last thread is joined.
struct Shared {
    state: CounterState,
    strategy: Strategy,
}

// Ends the run if a worker unwinds, so the others are not left waiting for a turn that never
// comes.
struct ShutdownOnPanic<'a> {
    shared: &'a Shared,
}

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shared.strategy.shutdown(&self.shared.state);
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Strategy the workers used.
    pub strategy: StrategyKind,
    /// Number of workers.
    pub total_workers: usize,
    /// The value the counter had to exceed.
    pub target: usize,
    /// Counter value after every worker stopped; always `target + 1`.
    pub final_value: usize,
    /// One entry per worker, in index order.
    pub workers: Vec<WorkerReport>,
    /// `transitions[v]` is the worker that moved the counter from `v` to `v + 1`, if recorded.
    pub transitions: Option<Vec<Option<usize>>>,
    /// Contention counters.
    pub stats: StatsSnapshot,
}

impl RunReport {
    /// Total advances over all workers.
    pub fn total_advances(&self) -> usize {
        self.workers.iter().map(|worker| worker.advances).sum()
    }

    /// Whether every transition was made by the worker whose turn it was, `None` if transitions
    /// were not recorded.
    pub fn is_round_robin(&self) -> Option<bool> {
        let total_workers = self.total_workers;
        self.transitions.as_ref().map(|transitions| {
            transitions
                .iter()
                .enumerate()
                .all(|(value, worker)| *worker == Some(value % total_workers))
        })
    }
}

/// Owns the worker threads of one run.
///
/// All workers are started by [`Orchestrator::start`]. Dropping the orchestrator without calling
/// [`join`](Orchestrator::join) still blocks until every thread has exited, so no worker ever
/// outlives the state it uses.
pub struct Orchestrator {
    config: RunConfig,
    shared: Arc<Shared>,
    handles: Vec<(usize, JoinHandle<WorkerReport>)>,
}

impl Orchestrator {
    /// Creates the counter state and spawns one thread per worker.
    ///
    /// If a thread cannot be created the run is stopped, the workers already running are joined
    /// and the spawn failure is returned.
    pub fn start(config: RunConfig) -> Result<Self> {
        let RunConfig {
            workers,
            target,
            strategy,
            pinning,
            record_transitions,
        } = config;

        if target == usize::MAX {
            return Err(Error::TargetOutOfRange { target });
        }

        let state = if record_transitions {
            CounterState::with_transition_log(workers, target)
        } else {
            CounterState::new(workers, target)
        };
        let shared = Arc::new(Shared {
            state,
            strategy: Strategy::new(strategy),
        });
        let binder = AffinityBinder::new(pinning);

        debug!(
            workers = workers.get(),
            target,
            strategy = %strategy,
            "starting run"
        );

        let mut handles = Vec::with_capacity(workers.get());
        for index in 0..workers.get() {
            let worker = Worker::new(index, &shared.state);
            let core = binder.core_for(index);
            let shared_copy = Arc::clone(&shared);

            let spawned = sync::spawn(format!("increment-{}", index), move || {
                if let Some(core) = core {
                    affinity::bind_current(index, core);
                }
                let shared = &*shared_copy;
                let _shutdown = ShutdownOnPanic { shared };
                worker.run(&shared.state, &shared.strategy)
            });

            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(source) => {
                    warn!(index, error = %source, "failed to spawn worker, stopping the run");
                    shared.strategy.shutdown(&shared.state);
                    for (_, handle) in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::Spawn { index, source });
                }
            }
        }

        Ok(Orchestrator {
            config,
            shared,
            handles,
        })
    }

    /// The configuration this run was started with.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The shared counter state, readable while the run is in progress.
    pub fn state(&self) -> &CounterState {
        &self.shared.state
    }

    /// Blocks until every worker has exited and summarizes the run.
    ///
    /// Every thread is joined even if one of them panicked; the first panicking worker is reported.
    pub fn join(mut self) -> Result<RunReport> {
        let handles = mem::take(&mut self.handles);

        let mut workers = Vec::with_capacity(handles.len());
        let mut panicked = None;
        for (index, handle) in handles {
            match handle.join() {
                Ok(report) => workers.push(report),
                Err(_) => {
                    warn!(index, "worker panicked");
                    panicked.get_or_insert(index);
                }
            }
        }

        if let Some(index) = panicked {
            return Err(Error::WorkerPanicked { index });
        }

        let state = &self.shared.state;
        let polls = workers.iter().map(|worker| worker.polls as u64).sum();
        let report = RunReport {
            strategy: self.shared.strategy.kind(),
            total_workers: state.total_workers(),
            target: state.target(),
            final_value: state.value(),
            workers,
            transitions: state.transitions(),
            stats: StatsSnapshot {
                polls,
                ..state.stats().snapshot()
            },
        };
        debug!(
            final_value = report.final_value,
            polls = report.stats.polls,
            "run complete"
        );

        Ok(report)
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("state", &self.shared.state)
            .field("running_workers", &self.handles.len())
            .finish()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
