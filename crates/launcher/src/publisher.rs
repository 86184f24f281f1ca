use crate::Error;
use std::{
    fs::{File, Permissions},
    io::{self, Write},
    os::unix::fs::PermissionsExt,
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::info;

/// Replace the watchlist artifact at `path` with `addresses`, one `0x`-prefixed
/// hexadecimal address per line.
///
/// The list is written to a temporary file next to `path`, synced, and renamed
/// over the artifact, so a reader sees either the previous list or the new
/// one in full.
pub fn publish_watchlist(path: &Path, addresses: &[u64]) -> Result<(), Error> {
    write_atomically(path, addresses).map_err(|source| Error::ArtifactWriteFailed {
        path: path.to_owned(),
        source,
    })?;
    info!(path = %path.display(), count = addresses.len(), "watchlist created");
    Ok(())
}

fn write_atomically(path: &Path, addresses: &[u64]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(format_watchlist(addresses).as_bytes())?;
    // the monitor may run under another user
    file.as_file().set_permissions(Permissions::from_mode(0o644))?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;

    File::open(dir)?.sync_all()
}

/// Render addresses exactly as [`publish_watchlist`] writes them.
pub fn format_watchlist(addresses: &[u64]) -> String {
    addresses
        .iter()
        .map(|address| format!("{address:#x}\n"))
        .collect()
}
