#![forbid(unsafe_code)]

use crate::{
    Clock, MatcherState, SystemClock,
    host::{MemoryAccess, StoreObserver},
};
use config::Config;
use flume::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{info, trace, warn};

/// A store that hit the watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchHit {
    pub vcpu: u32,
    pub address: u64,
}

/// Host-facing adapter: owns the matcher state and reports watched stores.
///
/// The state is behind a mutex, so reload-then-classify runs as one step even
/// when the host observes from several virtual CPUs.
pub struct WatchMonitor {
    state: Mutex<MatcherState>,
    clock: Box<dyn Clock>,
    hits: Sender<WatchHit>,
}

impl WatchMonitor {
    pub fn new(config: &Config) -> (Self, Receiver<WatchHit>) {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Box<dyn Clock>) -> (Self, Receiver<WatchHit>) {
        let watch = config.watch.clamp();
        let (hits, rx) = flume::bounded(watch.hit_buffer);
        let monitor = Self {
            state: Mutex::new(MatcherState::new(&config.artifact.path, &watch)),
            clock,
            hits,
        };
        (monitor, rx)
    }

    /// Attempt the initial watchlist load. A missing artifact is not an
    /// error here: stores are simply not watched until it appears.
    pub fn install(&self) {
        let mut state = self.state.lock();
        info!(path = %state.artifact().display(), "watching file");
        state.attempt_reload(self.clock.now());
        if !state.is_loaded() {
            warn!(path = %state.artifact().display(), "watchlist not available yet");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().is_loaded()
    }
}

impl StoreObserver for WatchMonitor {
    fn observe(&self, access: &MemoryAccess) {
        if !access.is_store {
            return;
        }

        let now = self.clock.now();
        if !self.state.lock().classify(access.address, now) {
            return;
        }

        info!(
            vcpu = access.vcpu,
            address = format_args!("{:#x}", access.address),
            "watched variable changed"
        );
        let hit = WatchHit {
            vcpu: access.vcpu,
            address: access.address,
        };
        match self.hits.try_send(hit) {
            Ok(()) => {}
            Err(TrySendError::Full(hit)) => warn!(?hit, "hit channel full, dropping hit"),
            Err(TrySendError::Disconnected(hit)) => trace!(?hit, "no hit receiver"),
        }
    }
}
