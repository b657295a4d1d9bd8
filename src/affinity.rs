//! Best-effort pinning of worker threads to CPU cores.
//!
//! Pinning is only a performance hint. When the platform does not expose affinity control, or the
//! OS refuses a request, the worker simply keeps running wherever the scheduler puts it.

use core_affinity::CoreId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How worker threads are mapped onto CPU cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinningPolicy {
    /// No pinning (standard OS scheduling).
    #[default]
    None,
    /// Worker `i` is pinned to core `i mod available_cores`.
    RoundRobin,
}

/// Hands out a core per worker according to a [`PinningPolicy`].
///
/// A binder with no cores is a no-op, which is what `PinningPolicy::None` and platforms without
/// affinity support end up with.
#[derive(Debug, Clone, Default)]
pub struct AffinityBinder {
    cores: Vec<CoreId>,
}

impl AffinityBinder {
    /// Detects the cores available to this process if `policy` asks for pinning.
    pub fn new(policy: PinningPolicy) -> Self {
        match policy {
            PinningPolicy::None => AffinityBinder::disabled(),
            PinningPolicy::RoundRobin => match core_affinity::get_core_ids() {
                Some(cores) if !cores.is_empty() => {
                    debug!(cores = cores.len(), "pinning workers round-robin");
                    AffinityBinder { cores }
                }
                _ => {
                    warn!("core ids unavailable, running without pinning");
                    AffinityBinder::disabled()
                }
            },
        }
    }

    /// A binder that never pins anything.
    pub fn disabled() -> Self {
        AffinityBinder { cores: Vec::new() }
    }

    /// Number of cores workers are spread across, zero when pinning is off.
    pub fn available_cores(&self) -> usize {
        self.cores.len()
    }

    /// The core worker `index` should run on, if pinning is enabled.
    pub fn core_for(&self, index: usize) -> Option<CoreId> {
        if self.cores.is_empty() {
            None
        } else {
            Some(self.cores[index % self.cores.len()])
        }
    }
}

/// Pins the calling thread to `core`. Returns whether the OS accepted the request.
pub fn bind_current(index: usize, core: CoreId) -> bool {
    if cfg!(loom) {
        return false;
    }

    let bound = core_affinity::set_for_current(core);
    if bound {
        debug!(index, core = core.id, "pinned worker");
    } else {
        warn!(index, core = core.id, "failed to pin worker, continuing unpinned");
    }
    bound
}
