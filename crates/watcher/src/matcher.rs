#![forbid(unsafe_code)]

use crate::{Error, WatchSet};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    /// The artifact changed and this many addresses are now resident.
    Loaded(usize),
    /// The artifact still has the version that is already resident.
    Unchanged,
}

/// Watch-side state for one artifact: the resident watchlist, the artifact
/// version it came from, and when a reload was last attempted.
///
/// Only [`reload`](Self::reload) replaces the resident set, and always as a
/// whole.
#[derive(Debug)]
pub struct MatcherState {
    artifact: PathBuf,
    reload_interval: Duration,
    max_entries: usize,
    watched: Option<Arc<WatchSet>>,
    loaded_version: Option<SystemTime>,
    last_reload_attempt: Option<Instant>,
}

impl MatcherState {
    pub fn new(artifact: impl Into<PathBuf>, settings: &config::Watch) -> Self {
        let settings = settings.clamp();
        Self {
            artifact: artifact.into(),
            reload_interval: settings.reload_interval,
            max_entries: settings.max_entries,
            watched: None,
            loaded_version: None,
            last_reload_attempt: None,
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// The last successfully loaded watchlist, if any.
    pub fn watched(&self) -> Option<Arc<WatchSet>> {
        self.watched.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.watched.is_some()
    }

    /// Re-read the artifact if its modification time differs from the
    /// resident version.
    ///
    /// On failure the previously loaded set, if any, stays resident.
    pub fn reload(&mut self) -> Result<ReloadStatus, Error> {
        let read_failed = |source| Error::ArtifactReadFailed {
            path: self.artifact.clone(),
            source,
        };

        let mut file = File::open(&self.artifact).map_err(read_failed)?;
        let version = file
            .metadata()
            .and_then(|meta| meta.modified())
            .map_err(read_failed)?;
        if self.watched.is_some() && self.loaded_version == Some(version) {
            return Ok(ReloadStatus::Unchanged);
        }

        let mut text = String::new();
        file.read_to_string(&mut text).map_err(read_failed)?;
        let set = WatchSet::parse(&self.artifact, &text, self.max_entries);
        let count = set.len();

        self.watched = Some(Arc::new(set));
        self.loaded_version = Some(version);
        info!(path = %self.artifact.display(), count, "loaded addresses from watchlist");
        Ok(ReloadStatus::Loaded(count))
    }

    /// Reload if `reload_interval` has passed since the previous attempt,
    /// whatever that attempt's outcome, or if none was made yet. Returns
    /// whether an attempt was made.
    pub fn attempt_reload(&mut self, now: Instant) -> bool {
        let due = self
            .last_reload_attempt
            .is_none_or(|last| now.saturating_duration_since(last) >= self.reload_interval);
        if !due {
            return false;
        }

        self.last_reload_attempt = Some(now);
        if let Err(err) = self.reload() {
            debug!(%err, "watchlist reload failed");
        }
        true
    }

    /// Whether a store to `address` at time `now` hits the watchlist.
    ///
    /// A due reload is attempted first. Until a watchlist has been loaded
    /// successfully nothing is watched.
    pub fn classify(&mut self, address: u64, now: Instant) -> bool {
        self.attempt_reload(now);
        self.watched
            .as_ref()
            .is_some_and(|watched| watched.contains(address))
    }
}
