use tracing::trace;

use super::TurnStrategy;
use crate::state::{AdvanceResult, CounterState};
use crate::sync::atomic::{AtomicBool, Ordering};
use crate::sync::spin_loop;

/// A user-space mutual exclusion lock built on a single atomic flag.
///
/// Acquiring spins until the flag can be claimed; there is no fairness and no blocking system call.
///
/// # Examples
///
/// ```
/// use round_robin_counter::strategy::SpinLock;
///
/// let lock = SpinLock::new();
/// let guard = lock.lock();
/// assert!(lock.try_lock().is_none());
///
/// drop(guard);
/// assert!(lock.try_lock().is_some());
/// ```
#[derive(Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    /// Creates an unlocked spin lock.
    pub fn new() -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is claimed by the caller.
    ///
    /// While the lock is held, waiters only load the flag; a claim is attempted once it reads
    /// clear.
    pub fn lock(&self) -> SpinLockGuard<'_> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Claims the lock if nobody holds it.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinLockGuard { lock: self })
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the [`SpinLock`] when dropped.
#[derive(Debug)]
#[must_use = "the spin lock is released as soon as the guard is dropped"]
pub struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

/// Double-checked locking around a [`SpinLock`].
///
/// Identical to [`MutexDoubleCheck`](super::MutexDoubleCheck) except that a worker waiting for the
/// lock never leaves user space.
#[derive(Debug, Default)]
pub struct SpinDoubleCheck {
    lock: SpinLock,
}

impl SpinDoubleCheck {
    /// Creates the strategy with an unlocked spin lock.
    pub fn new() -> Self {
        SpinDoubleCheck {
            lock: SpinLock::new(),
        }
    }
}

impl TurnStrategy for SpinDoubleCheck {
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult {
        if !state.is_my_turn(index) {
            return AdvanceResult::NotMyTurn;
        }

        let _guard = self.lock.lock();
        state.stats().record_lock_acquisition();

        if !state.is_my_turn(index) {
            state.stats().record_idle_lock_hold();
            trace!(index, "turn moved on before the spin lock was acquired");
            return AdvanceResult::NotMyTurn;
        }

        state.try_advance(index)
    }
}
