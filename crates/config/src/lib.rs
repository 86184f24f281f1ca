#![forbid(unsafe_code)]

mod artifact;
mod base_discovery;
mod error;
mod launch;
mod watch;

pub use artifact::Artifact;
pub use base_discovery::BaseDiscovery;
pub use error::Error;
pub use launch::Launch;
pub use watch::{MAX_ENTRIES_LIMIT, Watch};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file values, e.g.
/// `RVWATCH_WATCH__RELOAD_INTERVAL=5`.
pub const ENV_PREFIX: &str = "RVWATCH_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub artifact: Artifact,
    pub watch: Watch,
    pub launch: Launch,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `RVWATCH_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let config: Self = Self::figment().extract()?;
        Ok(config.normalized())
    }

    /// Load a TOML config file, layered over the defaults and under the
    /// environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Self::env())
            .extract()?;
        Ok(config.normalized())
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Self::env())
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn normalized(mut self) -> Self {
        self.watch = self.watch.clamp();
        self
    }
}
