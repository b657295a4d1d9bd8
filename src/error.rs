//! Errors surfaced by a run.

use std::io;

use thiserror::Error;

/// Failures that abort a run.
///
/// Passing the target is how a run ends normally, it is never reported as an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to create a worker thread. Workers started before it were stopped and joined.
    #[error("failed to spawn worker {index}")]
    Spawn {
        /// Index of the worker that could not be started.
        index: usize,
        /// Error reported by the OS.
        #[source]
        source: io::Error,
    },

    /// A worker thread unwound instead of returning.
    #[error("worker {index} panicked")]
    WorkerPanicked {
        /// Index of the worker that panicked.
        index: usize,
    },

    /// The counter cannot be pushed past this target without overflowing.
    #[error("target {target} leaves no room for the final increment")]
    TargetOutOfRange {
        /// The rejected target.
        target: usize,
    },
}

/// Unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}`, expected one of blocking-lock, spin-lock, wait-notify, lock-free")]
pub struct ParseStrategyError(pub String);

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
