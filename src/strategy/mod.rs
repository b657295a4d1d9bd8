//! The interchangeable policies deciding how a worker waits for its turn and publishes its
//! increment.
//!
//! See [crate level documentation](super) for how the strategies compare.
//!
//! | Strategy | Turn check | Protection | Wakeup |
//! |---|---|---|---|
//! | [`MutexDoubleCheck`] | unprotected peek, re-checked under the lock | blocking mutex | none, re-poll |
//! | [`SpinDoubleCheck`] | unprotected peek, re-checked under the lock | [`SpinLock`] | none, re-poll |
//! | [`WaitNotify`] | under the lock only | blocking mutex | condition variable, wake all |
//! | [`LockFree`] | relaxed load | none | none, compare-and-swap |

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseStrategyError;
use crate::state::{AdvanceResult, CounterState};

mod blocking;
mod lock_free;
mod spin;
mod wait_notify;

pub use self::blocking::MutexDoubleCheck;
pub use self::lock_free::LockFree;
pub use self::spin::{SpinDoubleCheck, SpinLock, SpinLockGuard};
pub use self::wait_notify::WaitNotify;

/// A policy that performs one turn-check-and-increment attempt for a worker.
///
/// Every implementation guarantees that only the worker whose turn it is can move the counter, and
/// that every worker gets to observe the end of the run in bounded time.
pub trait TurnStrategy: Send + Sync {
    /// Attempt to advance the counter on behalf of worker `index`.
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult;

    /// Ends the run early and makes sure no worker stays parked waiting for a turn.
    fn shutdown(&self, state: &CounterState) {
        state.finish();
    }
}

/// Names one of the four strategies; chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Blocking mutex behind a lock-free peek at the turn.
    BlockingLock,
    /// User-space spin lock behind a lock-free peek at the turn.
    SpinLock,
    /// Condition variable, every change is broadcast to every waiter.
    #[default]
    WaitNotify,
    /// No lock at all, the counter is moved with compare-and-swap.
    LockFree,
}

impl StrategyKind {
    /// Every strategy, in the order they are usually compared.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::BlockingLock,
        StrategyKind::SpinLock,
        StrategyKind::WaitNotify,
        StrategyKind::LockFree,
    ];

    /// The kebab-case name used on the command line and in serialized configs.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::BlockingLock => "blocking-lock",
            StrategyKind::SpinLock => "spin-lock",
            StrategyKind::WaitNotify => "wait-notify",
            StrategyKind::LockFree => "lock-free",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseStrategyError(s.to_owned()))
    }
}

/// The strategy instance shared by every worker of a run.
#[derive(Debug)]
pub enum Strategy {
    /// See [`MutexDoubleCheck`].
    BlockingLock(MutexDoubleCheck),
    /// See [`SpinDoubleCheck`].
    SpinLock(SpinDoubleCheck),
    /// See [`WaitNotify`].
    WaitNotify(WaitNotify),
    /// See [`LockFree`].
    LockFree(LockFree),
}

impl Strategy {
    /// Builds the synchronization objects `kind` needs.
    pub fn new(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::BlockingLock => Strategy::BlockingLock(MutexDoubleCheck::new()),
            StrategyKind::SpinLock => Strategy::SpinLock(SpinDoubleCheck::new()),
            StrategyKind::WaitNotify => Strategy::WaitNotify(WaitNotify::new()),
            StrategyKind::LockFree => Strategy::LockFree(LockFree::new()),
        }
    }

    /// Which strategy this is.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::BlockingLock(_) => StrategyKind::BlockingLock,
            Strategy::SpinLock(_) => StrategyKind::SpinLock,
            Strategy::WaitNotify(_) => StrategyKind::WaitNotify,
            Strategy::LockFree(_) => StrategyKind::LockFree,
        }
    }
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        Strategy::new(kind)
    }
}

impl TurnStrategy for Strategy {
    #[inline]
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult {
        match self {
            Strategy::BlockingLock(strategy) => strategy.advance(state, index),
            Strategy::SpinLock(strategy) => strategy.advance(state, index),
            Strategy::WaitNotify(strategy) => strategy.advance(state, index),
            Strategy::LockFree(strategy) => strategy.advance(state, index),
        }
    }

    fn shutdown(&self, state: &CounterState) {
        match self {
            Strategy::BlockingLock(strategy) => strategy.shutdown(state),
            Strategy::SpinLock(strategy) => strategy.shutdown(state),
            Strategy::WaitNotify(strategy) => strategy.shutdown(state),
            Strategy::LockFree(strategy) => strategy.shutdown(state),
        }
    }
}
