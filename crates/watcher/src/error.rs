#![forbid(unsafe_code)]

use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The watchlist artifact could not be opened, inspected, or read.
    #[error("failed to read watchlist {}: {source}", path.display())]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
