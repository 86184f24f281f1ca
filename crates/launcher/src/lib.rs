//! Start a target under trace control, turn static symbol offsets into
//! runtime addresses, and publish them for the watch side.

mod error;
mod launcher;
pub mod maps;
mod mode;
mod process;
mod publisher;

pub use error::Error;
pub use launcher::{LaunchReport, Launcher, WatchedVariable, runtime_addresses};
pub use mode::{AddressResolutionMode, runtime_address};
pub use process::{LifecycleState, ProcessExit, TracedProcess, executable_path};
pub use publisher::{format_watchlist, publish_watchlist};
