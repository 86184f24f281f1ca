#![forbid(unsafe_code)]

use crate::BaseDiscovery;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Launch {
    pub base: BaseDiscovery,
}
