use crate::{Error, maps};
use config::BaseDiscovery;
use nix::unistd::Pid;
use std::path::Path;
use symbols::ImageKind;

/// How static offsets become runtime addresses for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressResolutionMode {
    /// The image is loaded at its link-time addresses.
    FixedBase,
    /// The load base is read from the address-space map of the process.
    DiscoveredBase(Pid),
}

impl AddressResolutionMode {
    pub fn select(setting: BaseDiscovery, image_kind: ImageKind, pid: Pid) -> Self {
        match (setting, image_kind) {
            (BaseDiscovery::Fixed, _) | (BaseDiscovery::Auto, ImageKind::Fixed) => Self::FixedBase,
            (BaseDiscovery::Discovered, _)
            | (BaseDiscovery::Auto, ImageKind::PositionIndependent) => Self::DiscoveredBase(pid),
        }
    }

    /// `None` for a fixed image, the start of the image's lowest mapping
    /// otherwise.
    pub fn load_base(&self, image: &Path) -> Result<Option<u64>, Error> {
        match *self {
            Self::FixedBase => Ok(None),
            Self::DiscoveredBase(pid) => maps::discover_load_base(pid, image).map(Some),
        }
    }
}

pub fn runtime_address(static_offset: u64, load_base: Option<u64>) -> u64 {
    match load_base {
        Some(base) => base.wrapping_add(static_offset),
        None => static_offset,
    }
}
