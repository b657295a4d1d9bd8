#![warn(missing_docs)]

//! A fixed set of worker threads increments one shared counter in strict round-robin order: worker
//! *i* may advance the counter only when its value modulo the worker count equals *i*. Once the
//! counter exceeds a target every worker stops.
//!
//! The interesting part is not the counting but how a worker waits for its turn. The crate ships
//! four interchangeable [strategies](strategy) so their correctness and scalability can be compared
//! on the same workload.
//!
//! # Turns
//!
//! With three workers the counter is handed around like this:
//!
//! ```text
//! value    0 ──▶ 1 ──▶ 2 ──▶ 3 ──▶ 4 ──▶ 5 ──▶ 6 ──▶ ...
//! mover      w0    w1    w2    w0    w1    w2    w0
//! ```
//!
//! The advance that moves the counter from `v` to `v + 1` is always made by worker
//! `v % total_workers`. Whichever worker finds the counter past the target sets the shared
//! `finished` flag, and every worker leaves its loop as soon as it sees the flag. A completed run
//! therefore always ends with the counter at `target + 1`.
//!
//! # Strategies
//!
//! - **Blocking lock** peeks at the counter without synchronization and only takes a mutex when the
//!   peek says it is due, re-checking the turn under the lock.
//! - **Spin lock** is the same double-checked pattern around a user-space [`SpinLock`].
//! - **Wait/notify** parks workers on a condition variable and wakes *all* of them after every
//!   change; the publisher cannot know which parked worker is next.
//! - **Lock-free** skips locking entirely and publishes the increment with compare-and-swap.
//!
//! The double-checked strategies keep every idle worker spinning on the peek, so their cost grows
//! quickly with the worker count. That trade-off is kept as is; it is what the comparison is for.
//!
//! # Example
//!
//! ```
//! use core::num::NonZeroUsize;
//! use round_robin_counter::{RunConfig, StrategyKind};
//!
//! let workers = NonZeroUsize::new(4).unwrap();
//! for strategy in StrategyKind::ALL.iter().copied() {
//!     let report = RunConfig::new(workers, 100)
//!         .strategy(strategy)
//!         .run()
//!         .unwrap();
//!
//!     assert_eq!(report.final_value, 101);
//! }
//! ```
//!
//! [`SpinLock`]: strategy::SpinLock

use core::num::NonZeroUsize;

pub mod affinity;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod stats;
pub mod strategy;
pub mod timer;
pub mod worker;

mod sync;

pub use crate::affinity::PinningPolicy;
pub use crate::config::RunConfig;
pub use crate::error::{Error, ParseStrategyError, Result};
pub use crate::orchestrator::{Orchestrator, RunReport};
pub use crate::state::{AdvanceResult, CounterState};
pub use crate::strategy::{Strategy, StrategyKind, TurnStrategy};

/// Runs `total_workers` workers with the default strategy until the counter exceeds `target`.
///
/// Blocks until every worker thread has exited.
///
/// # Examples
///
/// ```
/// use core::num::NonZeroUsize;
///
/// let report = round_robin_counter::run(NonZeroUsize::new(2).unwrap(), 5).unwrap();
/// assert_eq!(report.final_value, 6);
/// ```
pub fn run(total_workers: NonZeroUsize, target: usize) -> Result<RunReport> {
    RunConfig::new(total_workers, target).run()
}
