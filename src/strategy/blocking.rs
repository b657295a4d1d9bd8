use tracing::trace;

use super::TurnStrategy;
use crate::state::{AdvanceResult, CounterState};
use crate::sync::Mutex;

/// Double-checked locking around a blocking mutex.
///
/// A worker first peeks at the counter without any synchronization and only pays for the lock
/// when the peek says it is due. The turn is checked again once the lock is held, since the counter
/// may have moved between the peek and the acquisition. Workers that are not due spin on the peek,
/// which is what makes this strategy burn CPU as the worker count grows.
#[derive(Debug)]
pub struct MutexDoubleCheck {
    lock: Mutex,
}

impl MutexDoubleCheck {
    /// Creates the strategy with an unlocked mutex.
    pub fn new() -> Self {
        MutexDoubleCheck { lock: Mutex::new() }
    }
}

impl Default for MutexDoubleCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnStrategy for MutexDoubleCheck {
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult {
        if !state.is_my_turn(index) {
            return AdvanceResult::NotMyTurn;
        }

        let _guard = self.lock.lock();
        state.stats().record_lock_acquisition();

        if !state.is_my_turn(index) {
            state.stats().record_idle_lock_hold();
            trace!(index, "turn moved on before the lock was acquired");
            return AdvanceResult::NotMyTurn;
        }

        state.try_advance(index)
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use core::num::NonZeroUsize;

    use super::*;

    #[test]
    fn skips_the_lock_when_not_due() {
        let state = CounterState::new(NonZeroUsize::new(2).unwrap(), 10);
        let strategy = MutexDoubleCheck::new();

        assert_eq!(strategy.advance(&state, 1), AdvanceResult::NotMyTurn);
        assert_eq!(state.stats().snapshot().lock_acquisitions, 0);

        assert_eq!(strategy.advance(&state, 0), AdvanceResult::Advanced);
        assert_eq!(state.stats().snapshot().lock_acquisitions, 1);
        assert_eq!(state.value(), 1);
    }
}
