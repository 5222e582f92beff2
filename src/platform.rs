//! Platform-specific disk geometry probing

use std::path::Path;

/// Round a logical size up to a whole number of allocation units.
pub fn round_to_allocation(len: u64, unit: u64) -> u64 {
    if unit == 0 {
        return len;
    }
    len.div_ceil(unit) * unit
}

/// Allocation unit (cluster size) of the volume holding `path`.
///
/// Only meaningful on Windows, where stat reports no block count and logical
/// sizes must be rounded up to the cluster size to approximate true disk
/// consumption. Unix targets report `None`; block counts are available there.
#[cfg(windows)]
pub fn allocation_granularity(path: &Path) -> Option<u64> {
    use std::os::windows::ffi::OsStrExt;
    use std::path::{Component, PathBuf};

    use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceW;
    use windows::core::PCWSTR;

    // volume root, e.g. "C:\"; a relative path queries the current drive
    let wide: Option<Vec<u16>> = if path.is_absolute() {
        let mut root = PathBuf::new();
        for comp in path.components() {
            root.push(comp.as_os_str());
            if matches!(comp, Component::RootDir) {
                break;
            }
        }
        Some(root.as_os_str().encode_wide().chain(Some(0)).collect())
    } else {
        None
    };

    let mut sectors_per_cluster = 0u32;
    let mut bytes_per_sector = 0u32;
    unsafe {
        GetDiskFreeSpaceW(
            wide.as_ref()
                .map(|w| PCWSTR(w.as_ptr()))
                .unwrap_or_else(PCWSTR::null),
            Some(&mut sectors_per_cluster),
            Some(&mut bytes_per_sector),
            None,
            None,
        )
    }
    .ok()?;

    let unit = sectors_per_cluster as u64 * bytes_per_sector as u64;
    (unit > 0).then_some(unit)
}

#[cfg(not(windows))]
pub fn allocation_granularity(_path: &Path) -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_allocation() {
        assert_eq!(round_to_allocation(0, 4096), 0);
        assert_eq!(round_to_allocation(1, 4096), 4096);
        assert_eq!(round_to_allocation(4096, 4096), 4096);
        assert_eq!(round_to_allocation(4097, 4096), 8192);
        assert_eq!(round_to_allocation(10_000, 512), 10_240);
    }

    #[test]
    fn test_round_to_allocation_zero_unit_is_identity() {
        assert_eq!(round_to_allocation(1234, 0), 1234);
    }
}
