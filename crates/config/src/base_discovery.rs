#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// How the launcher obtains the load base of the traced image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaseDiscovery {
    /// Decide from the ELF type: fixed for `ET_EXEC`, discovered for `ET_DYN`.
    #[default]
    Auto,
    /// Symbol offsets are used as runtime addresses.
    Fixed,
    /// Always read the base from the process address-space map.
    Discovered,
}
