//! The watch side: load the published watchlist and decide, for every
//! intercepted store, whether it writes a watched address. The watchlist is
//! re-read on a fixed interval so changes are picked up without stopping the
//! target.

mod artifact;
mod clock;
mod error;
pub mod host;
mod matcher;
mod monitor;

pub use artifact::WatchSet;
pub use clock::{Clock, SystemClock};
pub use error::Error;
pub use matcher::{MatcherState, ReloadStatus};
pub use monitor::{WatchHit, WatchMonitor};
