//! Run configuration.

use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::affinity::PinningPolicy;
use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::strategy::StrategyKind;

/// Everything needed to start a run.
///
/// # Examples
///
/// ```
/// use core::num::NonZeroUsize;
/// use round_robin_counter::{RunConfig, StrategyKind};
///
/// let report = RunConfig::new(NonZeroUsize::new(2).unwrap(), 5)
///     .strategy(StrategyKind::LockFree)
///     .record_transitions(true)
///     .run()
///     .unwrap();
///
/// assert_eq!(report.final_value, 6);
/// assert_eq!(report.is_round_robin(), Some(true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of worker threads taking turns.
    pub workers: NonZeroUsize,
    /// The run ends once the counter exceeds this value.
    pub target: usize,
    /// How workers wait for their turn.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Whether worker threads are pinned to cores.
    #[serde(default)]
    pub pinning: PinningPolicy,
    /// Whether to remember which worker performed every transition.
    #[serde(default)]
    pub record_transitions: bool,
}

impl RunConfig {
    /// A run of `workers` threads counting past `target` with the default strategy, no pinning
    /// and no transition log.
    pub fn new(workers: NonZeroUsize, target: usize) -> Self {
        RunConfig {
            workers,
            target,
            strategy: StrategyKind::default(),
            pinning: PinningPolicy::default(),
            record_transitions: false,
        }
    }

    /// Selects the strategy.
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Selects the pinning policy.
    pub fn pinning(mut self, pinning: PinningPolicy) -> Self {
        self.pinning = pinning;
        self
    }

    /// Turns the transition log on or off.
    pub fn record_transitions(mut self, record: bool) -> Self {
        self.record_transitions = record;
        self
    }

    /// Starts the run and blocks until every worker has finished.
    pub fn run(self) -> Result<RunReport> {
        Orchestrator::start(self)?.join()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfig::new(NonZeroUsize::new(3).unwrap(), 10);
        assert_eq!(config.strategy, StrategyKind::WaitNotify);
        assert_eq!(config.pinning, PinningPolicy::None);
        assert!(!config.record_transitions);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "workers": 4, "target": 100, "strategy": "lock-free" }"#)
                .unwrap();
        assert_eq!(
            config,
            RunConfig::new(NonZeroUsize::new(4).unwrap(), 100).strategy(StrategyKind::LockFree)
        );
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = serde_json::from_str::<RunConfig>(r#"{ "workers": 0, "target": 1 }"#);
        assert!(config.is_err());
    }
}
