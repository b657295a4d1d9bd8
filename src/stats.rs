//! Contention counters gathered while a run is in progress.
//!
//! Every counter is bumped with `Relaxed` ordering: they are only read after all workers have been
//! joined, and joining already orders those reads after every increment.
//!
//! Only events that already synchronize (taking a lock, parking, broadcasting, losing a CAS) are
//! counted here. Polls happen on the busy-wait path, so each worker tallies its own in
//! [`WorkerReport`](crate::worker::WorkerReport) and the orchestrator sums them after the join.

use serde::{Deserialize, Serialize};

use crate::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every worker of one run.
#[derive(Debug)]
pub struct Stats {
    lock_acquisitions: AtomicU64,
    idle_lock_holds: AtomicU64,
    parks: AtomicU64,
    broadcasts: AtomicU64,
    cas_retries: AtomicU64,
}

impl Stats {
    /// Creates a set of counters all starting at zero.
    pub fn new() -> Self {
        Stats {
            lock_acquisitions: AtomicU64::new(0),
            idle_lock_holds: AtomicU64::new(0),
            parks: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            cas_retries: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_lock_acquisition(&self) {
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle_lock_hold(&self) {
        self.idle_lock_holds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_park(&self) {
        self.parks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cas_retry(&self) {
        self.cas_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values. `polls` is left at zero, it is not tracked here.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            polls: 0,
            lock_acquisitions: self.lock_acquisitions.load(Ordering::Relaxed),
            idle_lock_holds: self.idle_lock_holds.load(Ordering::Relaxed),
            parks: self.parks.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Number of times any worker asked its strategy for a turn, summed over the worker reports.
    pub polls: u64,
    /// Exclusive lock acquisitions, spin lock included.
    pub lock_acquisitions: u64,
    /// Lock acquisitions that found it was not the holder's turn after all.
    pub idle_lock_holds: u64,
    /// Times a worker parked on the condition variable.
    pub parks: u64,
    /// Wake-all broadcasts issued on the condition variable.
    pub broadcasts: u64,
    /// Compare-and-swap attempts that lost and had to re-read the counter.
    pub cas_retries: u64,
}
