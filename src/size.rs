//! On-disk size probing and size-string conversions

use std::fs;
use std::io;
use std::path::Path;

const K: u64 = 1024;

/// Probe the on-disk size of a single filesystem entry.
///
/// Stats without following symbolic links, so a symlink is sized as its own
/// descriptor. On platforms that report a block count the allocated size
/// (`st_blocks * 512`) is returned, which accounts for sparse files and
/// filesystem block rounding. Elsewhere the logical length is used, rounded
/// up to the volume allocation unit when the platform probe can report one.
///
/// A failed stat is returned to the caller; the walker decides how to
/// recover (log and count the entry as zero bytes).
pub fn probe_size(path: &Path) -> io::Result<u64> {
    let meta = fs::symlink_metadata(path)?;
    Ok(allocated_size(path, &meta))
}

#[cfg(unix)]
fn allocated_size(_path: &Path, meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    // st_blocks is in units of 512-byte blocks regardless of the
    // filesystem's actual block size
    meta.blocks() * 512
}

#[cfg(not(unix))]
fn allocated_size(path: &Path, meta: &fs::Metadata) -> u64 {
    match crate::platform::allocation_granularity(path) {
        Some(unit) => crate::platform::round_to_allocation(meta.len(), unit),
        None => meta.len(),
    }
}

/// Convert a byte count to a compact engineering string: `2.0M`, `1.5G`.
///
/// Units step by 1024 with one decimal digit; below 1k the plain byte count
/// is returned.
pub fn size_to_eng(size: u64) -> String {
    let s = size as f64;
    if size > K.pow(5) {
        format!("{:.1}P", s / K.pow(5) as f64)
    } else if size > K.pow(4) {
        format!("{:.1}T", s / K.pow(4) as f64)
    } else if size > K.pow(3) {
        format!("{:.1}G", s / K.pow(3) as f64)
    } else if size > K.pow(2) {
        format!("{:.1}M", s / K.pow(2) as f64)
    } else if size > K {
        format!("{:.1}k", s / K as f64)
    } else {
        format!("{}", size)
    }
}

/// Parse a size string like `800k`, `2M`, `1G` into bytes.
///
/// Suffixes k/K, m/M, g/G, t/T, p/P each mean ×1024 of the previous; a bare
/// integer is a byte count.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let t = s.trim();
    let (num_str, multiplier) = match t.chars().next_back() {
        Some('k') | Some('K') => (&t[..t.len() - 1], K),
        Some('m') | Some('M') => (&t[..t.len() - 1], K.pow(2)),
        Some('g') | Some('G') => (&t[..t.len() - 1], K.pow(3)),
        Some('t') | Some('T') => (&t[..t.len() - 1], K.pow(4)),
        Some('p') | Some('P') => (&t[..t.len() - 1], K.pow(5)),
        _ => (t, 1),
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", t))
}
