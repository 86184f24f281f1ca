use crate::Error;
use nix::unistd::Pid;
use procfs::process::{MMapPath, Process};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// One line of a process's address-space map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: u64,
    pub end: u64,
    /// Backing file, if the region maps one.
    pub path: Option<PathBuf>,
}

impl Region {
    pub fn new(start: u64, end: u64, path: Option<impl Into<PathBuf>>) -> Self {
        Self {
            start,
            end,
            path: path.map(Into::into),
        }
    }
}

/// Read `/proc/<pid>/maps` in ascending address order.
pub fn read_regions(pid: Pid) -> Result<Vec<Region>, Error> {
    let maps_failed = |source| Error::MapsReadFailed {
        pid: pid.as_raw(),
        source,
    };
    let maps = Process::new(pid.as_raw())
        .and_then(|process| process.maps())
        .map_err(maps_failed)?;

    let mut regions: Vec<Region> = maps
        .into_iter()
        .map(|map| Region {
            start: map.address.0,
            end: map.address.1,
            path: match map.pathname {
                MMapPath::Path(path) => Some(path),
                _ => None,
            },
        })
        .collect();
    regions.sort_by_key(|region| region.start);
    Ok(regions)
}

/// Start of the lowest region backed by `image`.
///
/// `image` should already be canonical, as the kernel reports resolved paths.
/// The lowest region of a freshly exec'd image is normally its own first
/// segment; when something else sits below it a warning is logged and the
/// image's own mapping is still used.
pub fn select_load_base(regions: &[Region], image: &Path) -> Option<u64> {
    let base = regions
        .iter()
        .filter(|region| {
            region
                .path
                .as_deref()
                .and_then(sanitize_mapped_path)
                .is_some_and(|path| path == image)
        })
        .map(|region| region.start)
        .min()?;

    if let Some(lowest) = regions.first()
        && lowest.start != base
    {
        warn!(
            lowest = format_args!("{:#x}", lowest.start),
            lowest_path = ?lowest.path,
            base = format_args!("{base:#x}"),
            "lowest mapping is not the target image"
        );
    }
    Some(base)
}

/// Load base of `image` inside the stopped process `pid`.
pub fn discover_load_base(pid: Pid, image: &Path) -> Result<u64, Error> {
    let image = fs::canonicalize(image).unwrap_or_else(|_| image.to_owned());
    let regions = read_regions(pid)?;
    debug!(%pid, regions = regions.len(), "read address-space map");

    select_load_base(&regions, &image).ok_or_else(|| Error::TraceProtocolFailed {
        pid: pid.as_raw(),
        reason: format!("no mapping is backed by {}", image.display()),
    })
}

/// Strip the prelink suffix from a mapped path; reject deleted files.
fn sanitize_mapped_path(path: &Path) -> Option<&Path> {
    if !path.has_root() {
        return None;
    }
    let text = path.to_str()?;
    // /bin/bash.#prelink#.12345 maps the same image as /bin/bash
    let stripped = text.split(".#prelink#.").next()?;
    if text.ends_with("(deleted)") {
        return None;
    }
    Some(Path::new(stripped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IMAGE: &str = "/usr/bin/target";

    fn regions() -> Vec<Region> {
        vec![
            Region::new(0x5555_5555_4000, 0x5555_5555_5000, Some(IMAGE)),
            Region::new(0x5555_5555_5000, 0x5555_5555_6000, Some(IMAGE)),
            Region::new(0x7fff_f7fc_3000, 0x7fff_f7fc_5000, None::<PathBuf>),
            Region::new(0x7fff_f7fc_5000, 0x7fff_f7fc_7000, Some("/usr/lib/ld-linux-x86-64.so.2")),
        ]
    }

    #[test]
    fn base_is_first_image_region() {
        assert_eq!(
            select_load_base(&regions(), Path::new(IMAGE)),
            Some(0x5555_5555_4000)
        );
    }

    #[test]
    fn foreign_lowest_region_is_skipped() {
        let mut regions = regions();
        regions.insert(0, Region::new(0x1000, 0x2000, Some("/usr/lib/preloaded.so")));
        assert_eq!(
            select_load_base(&regions, Path::new(IMAGE)),
            Some(0x5555_5555_4000)
        );
    }

    #[test]
    fn unmapped_image_has_no_base() {
        assert_eq!(select_load_base(&regions(), Path::new("/usr/bin/other")), None);
        assert_eq!(select_load_base(&[], Path::new(IMAGE)), None);
    }

    #[test]
    fn deleted_image_does_not_match() {
        let regions = [Region::new(0x4000, 0x5000, Some("/usr/bin/target (deleted)"))];
        assert_eq!(select_load_base(&regions, Path::new(IMAGE)), None);
    }

    #[test]
    fn prelinked_image_matches() {
        let regions = [Region::new(0x4000, 0x5000, Some("/usr/bin/target.#prelink#.12345"))];
        assert_eq!(select_load_base(&regions, Path::new(IMAGE)), Some(0x4000));
    }

    #[test]
    fn own_process_maps_contain_current_exe() {
        let exe = fs::canonicalize(std::env::current_exe().unwrap()).unwrap();
        let base = discover_load_base(Pid::this(), &exe).unwrap();
        assert_eq!(base % 0x1000, 0);
    }

    #[test]
    fn unmapped_image_is_a_trace_protocol_failure() {
        let err = discover_load_base(Pid::this(), Path::new("/nonexistent/target")).unwrap_err();
        assert!(matches!(
            err,
            Error::TraceProtocolFailed { ref reason, .. } if reason.contains("/nonexistent/target")
        ));
    }
}
