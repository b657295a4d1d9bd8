use tracing::trace;

use super::TurnStrategy;
use crate::state::{AdvanceResult, CounterState};
use crate::sync::{Condvar, Mutex};

/// Workers park on a condition variable until the counter is theirs or the run is over.
///
/// The waiting predicate is only evaluated with the lock held, and the condition variable releases
/// the lock while a worker is parked, so a worker that is not due never holds the lock while idle.
///
/// After every advance, and after the run is marked finished, *all* waiters are woken. Whoever
/// publishes a change cannot tell which parked thread owns the next turn, so waking a single
/// waiter could wake the wrong one and leave the rightful owner parked forever.
#[derive(Debug)]
pub struct WaitNotify {
    lock: Mutex,
    turn_changed: Condvar,
}

impl WaitNotify {
    /// Creates the strategy with an unlocked mutex and no waiters.
    pub fn new() -> Self {
        WaitNotify {
            lock: Mutex::new(),
            turn_changed: Condvar::new(),
        }
    }

    fn broadcast(&self, state: &CounterState) {
        let woken = self.turn_changed.notify_all();
        state.stats().record_broadcast();
        trace!(woken, "broadcast turn change");
    }
}

impl Default for WaitNotify {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnStrategy for WaitNotify {
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult {
        let mut guard = self.lock.lock();
        state.stats().record_lock_acquisition();

        while !state.is_finished() && !state.is_my_turn(index) {
            state.stats().record_park();
            guard = self.turn_changed.wait(guard);
        }

        let result = if state.is_finished() {
            AdvanceResult::Done
        } else {
            state.try_advance(index)
        };
        if result == AdvanceResult::NotMyTurn {
            state.stats().record_idle_lock_hold();
        }
        drop(guard);

        self.broadcast(state);
        result
    }

    fn shutdown(&self, state: &CounterState) {
        // Flip the flag under the lock so a waiter cannot check the predicate, miss the flag and
        // then park after the broadcast below.
        {
            let _guard = self.lock.lock();
            state.finish();
        }
        self.broadcast(state);
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use core::num::NonZeroUsize;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn parked_worker_wakes_on_shutdown() {
        let state = Arc::new(CounterState::new(NonZeroUsize::new(2).unwrap(), 10));
        let strategy = Arc::new(WaitNotify::new());

        let parked = {
            let state = state.clone();
            let strategy = strategy.clone();
            // worker 1 is not due while the counter sits at 0, so it parks
            thread::spawn(move || strategy.advance(&state, 1))
        };

        while state.stats().snapshot().parks == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        strategy.shutdown(&state);

        assert_eq!(parked.join().unwrap(), AdvanceResult::Done);
        assert_eq!(state.value(), 0);
    }

    #[test]
    fn parked_worker_wakes_on_its_turn() {
        let state = Arc::new(CounterState::new(NonZeroUsize::new(2).unwrap(), 10));
        let strategy = Arc::new(WaitNotify::new());

        let parked = {
            let state = state.clone();
            let strategy = strategy.clone();
            thread::spawn(move || strategy.advance(&state, 1))
        };

        while state.stats().snapshot().parks == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(strategy.advance(&state, 0), AdvanceResult::Advanced);

        assert_eq!(parked.join().unwrap(), AdvanceResult::Advanced);
        assert_eq!(state.value(), 2);
        assert_eq!(state.stats().snapshot().idle_lock_holds, 0);
    }
}
