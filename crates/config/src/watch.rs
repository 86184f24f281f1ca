#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// Upper bound on resident watchlist entries.
pub const MAX_ENTRIES_LIMIT: usize = 4096;

#[serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Watch {
    /// Minimum time between two watchlist reload attempts, in seconds.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub reload_interval: Duration,

    /// Maximum number of addresses kept from the watchlist file.
    pub max_entries: usize,

    /// Capacity of the channel carrying watched-store hits.
    pub hit_buffer: usize,
}

impl Default for Watch {
    fn default() -> Self {
        Self {
            reload_interval: Duration::from_secs(2),
            max_entries: 512,
            hit_buffer: 1024,
        }
    }
}

impl Watch {
    /// Bring the entry limit and hit buffer into their usable ranges.
    pub fn clamp(self) -> Self {
        Self {
            reload_interval: self.reload_interval,
            max_entries: self.max_entries.clamp(1, MAX_ENTRIES_LIMIT),
            hit_buffer: self.hit_buffer.max(1),
        }
    }
}
