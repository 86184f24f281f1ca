#![forbid(unsafe_code)]

use std::{collections::HashSet, path::Path};
use tracing::warn;

/// The resident set of watched addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    addresses: HashSet<u64>,
}

impl WatchSet {
    /// Parse watchlist text: one hexadecimal address per line, `0x` prefix
    /// optional, blank lines ignored. Lines that are not an address are
    /// skipped with a warning. Entries past `max_entries` are dropped.
    pub fn parse(path: &Path, text: &str, max_entries: usize) -> Self {
        let mut addresses = HashSet::new();
        let mut dropped = 0usize;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(address) = parse_address(line) else {
                warn!(
                    path = %path.display(),
                    line = index + 1,
                    content = line,
                    "skipping malformed watchlist line"
                );
                continue;
            };
            if addresses.len() >= max_entries && !addresses.contains(&address) {
                dropped += 1;
                continue;
            }
            addresses.insert(address);
        }

        if dropped > 0 {
            warn!(
                path = %path.display(),
                max_entries,
                dropped,
                "watchlist exceeds entry limit"
            );
        }
        Self { addresses }
    }

    pub fn contains(&self, address: u64) -> bool {
        self.addresses.contains(&address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.addresses.iter().copied()
    }
}

impl FromIterator<u64> for WatchSet {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}

fn parse_address(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn parse(text: &str) -> WatchSet {
        WatchSet::parse(Path::new("watchlist.txt"), text, 512)
    }

    #[test]
    fn parses_prefixed_and_bare_hex() {
        let set = parse("0x4028\n\n0X10\n  ff  \n");
        assert_eq!(set, WatchSet::from_iter([0x4028, 0x10, 0xff]));
    }

    #[test]
    fn empty_text_is_an_empty_set() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let set = parse(
            "0x4028\n0x5000 \n0x6000 # new\nnot-an-address\n0x\n0x1ffffffffffffffff\n0x7000\n",
        );
        assert_eq!(set, WatchSet::from_iter([0x4028, 0x5000, 0x7000]));
    }

    #[test]
    fn entries_past_limit_are_dropped() {
        let set = WatchSet::parse(Path::new("w"), "0x1\n0x2\n0x1\n0x3\n", 2);
        assert_eq!(set, WatchSet::from_iter([0x1, 0x2]));
    }

    proptest! {
        #[test]
        fn limit_keeps_the_first_distinct_entries(
            addresses in prop::collection::vec(0u64..64, 0..128),
            max_entries in 1usize..32,
        ) {
            let text: String = addresses.iter().map(|a| format!("{a:#x}\n")).collect();
            let set = WatchSet::parse(Path::new("w"), &text, max_entries);

            let mut expected = Vec::new();
            for address in &addresses {
                if expected.len() < max_entries && !expected.contains(address) {
                    expected.push(*address);
                }
            }
            prop_assert_eq!(set, WatchSet::from_iter(expected));
        }
    }
}
