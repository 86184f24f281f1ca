#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Artifact {
    /// Watchlist file shared between the launcher and the monitor.
    pub path: PathBuf,
}

impl Default for Artifact {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("rv-watch").join("watchlist.txt"),
        }
    }
}
