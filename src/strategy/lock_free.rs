use super::TurnStrategy;
use crate::state::{AdvanceResult, CounterState};

/// No lock at all: a worker that is not due returns straight away, a worker that is due moves the
/// counter with compare-and-swap.
///
/// Polling uses relaxed loads since they only gate whether the update is attempted. The
/// compare-and-swap inside [`CounterState::try_advance`] retries the whole check whenever it fails,
/// so a spurious failure is never mistaken for "not my turn".
#[derive(Debug, Default, Clone, Copy)]
pub struct LockFree;

impl LockFree {
    /// Creates the strategy. It has no synchronization object of its own.
    pub fn new() -> Self {
        LockFree
    }
}

impl TurnStrategy for LockFree {
    #[inline]
    fn advance(&self, state: &CounterState, index: usize) -> AdvanceResult {
        if !state.is_my_turn(index) {
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
    fn never_takes_a_lock() {
        let state = CounterState::new(NonZeroUsize::new(2).unwrap(), 3);
        let strategy = LockFree::new();

        assert_eq!(strategy.advance(&state, 1), AdvanceResult::NotMyTurn);
        assert_eq!(strategy.advance(&state, 0), AdvanceResult::Advanced);
        assert_eq!(strategy.advance(&state, 1), AdvanceResult::Advanced);
        assert_eq!(state.stats().snapshot().lock_acquisitions, 0);
    }
}
