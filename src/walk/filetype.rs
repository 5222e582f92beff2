//! Special file classification
//!
//! Named pipes and sockets can block indefinitely on read and have no
//! meaningful size, so the walker excludes them from collection.

use std::fs;
use std::io;
use std::path::Path;

/// Which special file types the walker skips. Both default on; the original
/// hard-coded set is a platform convenience, so it is a knob here.
#[derive(Debug, Clone, Copy)]
pub struct SpecialTypes {
    pub fifo: bool,
    pub socket: bool,
}

impl SpecialTypes {
    /// Skip nothing; every stat-able entry is sized.
    pub fn none() -> Self {
        Self {
            fifo: false,
            socket: false,
        }
    }
}

impl Default for SpecialTypes {
    fn default() -> Self {
        Self {
            fifo: true,
            socket: true,
        }
    }
}

/// Whether `path` is a special file the walker should skip.
///
/// Stats without following symlinks: a symlink is never skippable itself, it
/// is sized as the descriptor it is. A failed stat is returned to the caller,
/// which treats the entry as skippable (an unstat-able node must never block
/// collection).
pub fn is_skippable(path: &Path, skip: &SpecialTypes) -> io::Result<bool> {
    let meta = fs::symlink_metadata(path)?;
    Ok(is_special(&meta.file_type(), skip))
}

#[cfg(unix)]
fn is_special(file_type: &fs::FileType, skip: &SpecialTypes) -> bool {
    use std::os::unix::fs::FileTypeExt;
    (skip.fifo && file_type.is_fifo()) || (skip.socket && file_type.is_socket())
}

#[cfg(not(unix))]
fn is_special(_file_type: &fs::FileType, _skip: &SpecialTypes) -> bool {
    false
}
