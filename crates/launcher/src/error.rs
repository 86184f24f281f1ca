use std::{io, path::PathBuf};

/// Represents all possible errors that can occur while launching a target.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Symbol reading or resolution failed before anything was started.
    #[error(transparent)]
    Symbols(#[from] symbols::Error),

    /// The child could not be created or could not exec the image.
    #[error("failed to launch {}: {source}", path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The traced child did not behave as the trace protocol requires, or
    /// none of its mappings is backed by the target image.
    #[error("trace protocol failed for pid {pid}: {reason}")]
    TraceProtocolFailed { pid: i32, reason: String },

    /// A trace-protocol failure: a `ptrace` or `waitpid` request was
    /// rejected.
    #[error("ptrace request failed for pid {pid}: {source}")]
    Ptrace {
        pid: i32,
        #[source]
        source: nix::Error,
    },

    /// A trace-protocol failure: the address-space map of the child could
    /// not be read.
    #[error("failed to read memory maps of pid {pid}: {source}")]
    MapsReadFailed {
        pid: i32,
        #[source]
        source: procfs::ProcError,
    },

    /// The watchlist artifact could not be written.
    #[error("failed to write watchlist {}: {source}", path.display())]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
