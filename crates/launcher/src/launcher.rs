use crate::{
    AddressResolutionMode, Error, ProcessExit, TracedProcess, executable_path, publish_watchlist,
    runtime_address,
};
use config::{BaseDiscovery, Config};
use nix::unistd::Pid;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use symbols::{Resolution, SymbolTable, resolve};
use tracing::info;

/// A resolved variable and the address published for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedVariable {
    pub name: String,
    pub static_offset: u64,
    pub address: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub pid: Pid,
    pub load_base: Option<u64>,
    pub watched: Vec<WatchedVariable>,
    pub exit: ProcessExit,
}

/// Resolves the watched variables of a target, starts it stopped, publishes
/// their runtime addresses, and lets it run to completion.
#[derive(Debug, Clone)]
pub struct Launcher {
    artifact: PathBuf,
    base: BaseDiscovery,
}

impl Launcher {
    pub fn new(config: &Config) -> Self {
        Self {
            artifact: config.artifact.path.clone(),
            base: config.launch.base,
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Run `image` with `args`, watching the variables named in `required`.
    ///
    /// Every failure is terminal; nothing is retried.
    pub fn run<S: AsRef<str>>(
        &self,
        image: &Path,
        args: &[OsString],
        required: &[S],
    ) -> Result<LaunchReport, Error> {
        info!(count = required.len(), "tracking variables");

        // symbols, exec and the maps lookup all go through this one path
        let image = executable_path(image)?;
        let table = SymbolTable::read(&image)?;
        let resolution = resolve(&table, required)?;
        for symbol in &resolution {
            info!(
                name = %symbol.name,
                offset = format_args!("{:#x}", symbol.static_offset),
                "static offset"
            );
        }

        let mut process = TracedProcess::spawn(&image, args)?;
        let mode = AddressResolutionMode::select(self.base, table.image_kind(), process.pid());
        let load_base = process.resolve_load_base(mode)?;

        let watched = runtime_addresses(&resolution, load_base);
        for variable in &watched {
            info!(
                name = %variable.name,
                address = format_args!("{:#x}", variable.address),
                "runtime address"
            );
        }
        let addresses: Vec<u64> = watched.iter().map(|variable| variable.address).collect();
        publish_watchlist(&self.artifact, &addresses)?;

        info!("resuming target program");
        process.resume()?;
        let exit = process.wait()?;
        info!(pid = %process.pid(), %exit, "target program finished");

        Ok(LaunchReport {
            pid: process.pid(),
            load_base,
            watched,
            exit,
        })
    }
}

/// Runtime addresses of every resolved symbol, in resolution order.
pub fn runtime_addresses(resolution: &Resolution, load_base: Option<u64>) -> Vec<WatchedVariable> {
    resolution
        .iter()
        .map(|symbol| WatchedVariable {
            name: symbol.name.clone(),
            static_offset: symbol.static_offset,
            address: runtime_address(symbol.static_offset, load_base),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use symbols::testing::ElfBuilder;

    fn resolution() -> Resolution {
        let image = ElfBuilder::elf64()
            .object("x", 0x4028, 4)
            .object("y", 0x402c, 4)
            .build();
        let table = SymbolTable::parse(&image).unwrap();
        resolve(&table, &["y", "x"]).unwrap()
    }

    #[test]
    fn fixed_image_addresses_are_static_offsets() {
        let watched = runtime_addresses(&resolution(), None);
        assert_eq!(
            watched,
            [
                WatchedVariable {
                    name: "y".into(),
                    static_offset: 0x402c,
                    address: 0x402c
                },
                WatchedVariable {
                    name: "x".into(),
                    static_offset: 0x4028,
                    address: 0x4028
                },
            ]
        );
    }

    #[test]
    fn discovered_base_is_added() {
        let watched = runtime_addresses(&resolution(), Some(0x5555_0000_0000));
        let addresses: Vec<u64> = watched.iter().map(|v| v.address).collect();
        assert_eq!(addresses, [0x5555_0000_402c, 0x5555_0000_4028]);
    }

    #[test]
    fn unresolved_names_stop_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("target");
        std::fs::write(&image, ElfBuilder::elf64().object("x", 0x4028, 4).build()).unwrap();

        let mut config = Config::new();
        config.artifact.path = dir.path().join("watchlist.txt");
        let err = Launcher::new(&config)
            .run(&image, &[], &["x", "z"])
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Symbols(symbols::Error::UnresolvedSymbols(ref missing)) if missing == &["z"]
        ));
        assert!(!config.artifact.path.exists());
    }
}
