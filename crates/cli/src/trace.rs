//! Store traces for offline replay: one access per line, `[r|w] <hex address>`.

use crate::Error;
use std::io::BufRead;
use watcher::host::MemoryAccess;

/// Parse line `number` of a trace. Blank lines and `#` comments yield
/// `None`.
fn parse_line(number: usize, line: &str, vcpu: u32) -> Result<Option<MemoryAccess>, Error> {
    let malformed = || Error::MalformedTrace {
        line: number,
        content: line.to_owned(),
    };

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut fields = trimmed.split_whitespace();
    let (is_store, address) = match (fields.next(), fields.next(), fields.next()) {
        (Some("w" | "W"), Some(address), None) => (true, address),
        (Some("r" | "R"), Some(address), None) => (false, address),
        (Some(address), None, None) => (true, address),
        _ => return Err(malformed()),
    };
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let address = u64::from_str_radix(digits, 16).map_err(|_| malformed())?;

    Ok(Some(if is_store {
        MemoryAccess::store(vcpu, address)
    } else {
        MemoryAccess::load(vcpu, address)
    }))
}

/// Feed every access of `reader` to `on_access`, attributed to `vcpu`.
/// Returns the number of accesses replayed.
pub fn replay<R, F>(reader: R, vcpu: u32, mut on_access: F) -> Result<usize, Error>
where
    R: BufRead,
    F: FnMut(MemoryAccess) -> Result<(), Error>,
{
    let mut count = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(Error::TraceRead)?;
        if let Some(access) = parse_line(index + 1, &line, vcpu)? {
            on_access(access)?;
            count += 1;
        }
    }
    Ok(count)
}
