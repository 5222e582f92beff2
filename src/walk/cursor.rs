//! Shared traversal position for hang diagnostics

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Position {
    dir: PathBuf,
    file: OsString,
}

/// Single-slot holder for the walker's current position.
///
/// The walker overwrites it continuously; the watchdog thread reads it only
/// when it fires, to name the directory and file under examination. The
/// value is advisory and never feeds back into traversal decisions.
#[derive(Clone, Default)]
pub struct TraversalCursor {
    inner: Arc<Mutex<Position>>,
}

impl TraversalCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_dir(&self, dir: &Path) {
        let mut pos = self.lock();
        pos.dir = dir.to_path_buf();
        pos.file.clear();
    }

    pub fn at_file(&self, name: &OsStr) {
        self.lock().file = name.to_os_string();
    }

    pub fn snapshot(&self) -> (PathBuf, OsString) {
        let pos = self.lock();
        (pos.dir.clone(), pos.file.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Position> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
