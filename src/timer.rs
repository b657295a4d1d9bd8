//! Scoped wall-clock timer.

use std::convert::TryFrom;
use std::time::{Duration, Instant};

use tracing::info;

/// Logs how long it lived when dropped.
///
/// Purely observational; wrap a [`run`](crate::run) call in it to report elapsed time.
///
/// # Examples
///
/// ```
/// use round_robin_counter::timer::ElapsedTimer;
///
/// let timer = ElapsedTimer::new("main");
/// // ... timed work ...
/// assert_eq!(timer.label(), "main");
/// ```
#[derive(Debug)]
#[must_use = "the timer reports when it goes out of scope"]
pub struct ElapsedTimer {
    label: &'static str,
    start: Instant,
}

impl ElapsedTimer {
    /// Starts timing a block called `label`.
    pub fn new(label: &'static str) -> Self {
        ElapsedTimer {
            label,
            start: Instant::now(),
        }
    }

    /// Name of the timed block.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Time since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        let micros = u64::try_from(self.elapsed().as_micros()).unwrap_or(u64::MAX);
        info!(block = self.label, micros, "{}: {} micros passed", self.label, micros);
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn elapsed_grows() {
        let timer = ElapsedTimer::new("test");
        thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() >= Duration::from_millis(2));
    }
}
