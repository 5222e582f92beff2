//! TreeWalker - recursive size-accumulating traversal

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::diag::Diag;
use crate::size::probe_size;
use crate::watchdog::Watchdog;

use super::config::WalkConfig;
use super::cursor::TraversalCursor;
use super::filetype::is_skippable;
use super::PathSizeMap;

/// Result of one scan.
pub struct WalkReport {
    pub sizes: PathSizeMap,
    pub entries_processed: u64,
}

/// Depth-first walker that attributes every entry's on-disk size to itself
/// and to every ancestor directory up to the scan root.
///
/// Single-threaded and synchronous; the only companion thread is the
/// watchdog, which is reset at every progress checkpoint.
pub struct TreeWalker {
    config: WalkConfig,
    exclude: Option<Regex>,
    cursor: TraversalCursor,
    watchdog: Watchdog,
    entries_processed: u64,
}

impl TreeWalker {
    pub fn new(config: WalkConfig, cursor: TraversalCursor, watchdog: Watchdog) -> Self {
        // the exclusion is a literal substring; escaping makes it regex-safe
        let exclude = config
            .exclude
            .as_deref()
            .and_then(|s| Regex::new(&regex::escape(s)).ok());
        Self {
            config,
            exclude,
            cursor,
            watchdog,
            entries_processed: 0,
        }
    }

    /// Walk `root` and return the populated size map.
    pub fn walk(&mut self, root: &Path, diag: &mut Diag) -> WalkReport {
        let mut sizes = PathSizeMap::new();
        self.entries_processed = 0;

        self.watchdog.arm();
        self.walk_dir(root, root, &mut sizes, diag);
        self.watchdog.cancel();

        // the root is never visited as anyone's child; fold in its own
        // descriptor size
        let root_size = self.probe_entry(root, diag);
        *sizes.entry(root.to_path_buf()).or_insert(0) += root_size;
        self.entries_processed += 1;

        diag.progress_done(&format!("{} files processed.", self.entries_processed));

        WalkReport {
            sizes,
            entries_processed: self.entries_processed,
        }
    }

    fn walk_dir(&mut self, dir: &Path, root: &Path, sizes: &mut PathSizeMap, diag: &mut Diag) {
        self.cursor.enter_dir(dir);

        if self.matches_exclude(dir) {
            diag.line(&format!("skipping root {}", dir.display()));
            return;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                diag.warn(&format!("Can't read {}", dir.display()));
                diag.warn(&format!("({:?})", err.kind()));
                return;
            }
        };

        let mut files: Vec<OsString> = Vec::new();
        let mut subdirs: Vec<OsString> = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            // file_type never traverses symlinks, so a symlink to a
            // directory stays in the file list: sized, not descended
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => subdirs.push(entry.file_name()),
                _ => files.push(entry.file_name()),
            }
        }
        files.sort();
        subdirs.sort();

        // prune excluded subdirectories before they are sized or descended
        subdirs.retain(|name| {
            let path = dir.join(name);
            if self.matches_exclude(&path) {
                diag.line(&format!("excluding: {}", path.display()));
                false
            } else {
                true
            }
        });

        // remote-mount roots are pruned only when scanning from the
        // filesystem root
        if dir.parent().is_none() {
            let mounts = &self.config.mount_excludes;
            subdirs.retain(|name| {
                if mounts.iter().any(|m| name.as_os_str() == OsStr::new(m)) {
                    diag.line(&format!("excluding: {}", dir.join(name).display()));
                    false
                } else {
                    true
                }
            });
        }

        // directories join the same per-entry loop as files so each one
        // contributes its own descriptor size as well as its contents
        for name in files.iter().chain(subdirs.iter()) {
            self.cursor.at_file(name);
            let path = dir.join(name);

            match is_skippable(&path, &self.config.skip_special) {
                Ok(false) => {}
                Ok(true) => {
                    diag.warn(&format!("Bad filetype: {}", path.display()));
                    continue;
                }
                Err(_) => {
                    // an unstat-able node must never block collection
                    diag.warn(&format!("Can't stat: {}", path.display()));
                    continue;
                }
            }

            if self.matches_exclude(&path) {
                diag.line(&format!("skipping file {}", path.display()));
                continue;
            }

            let size = self.probe_entry(&path, diag);
            propagate_size(sizes, &path, root, size);

            self.entries_processed += 1;
            if self.config.progress_interval > 0
                && self.entries_processed % self.config.progress_interval == 0
            {
                diag.progress(&format!("{} files processed.", self.entries_processed));
                self.watchdog.reset();
            }
        }

        for name in &subdirs {
            self.walk_dir(&dir.join(name), root, sizes, diag);
        }
    }

    fn probe_entry(&self, path: &Path, diag: &mut Diag) -> u64 {
        match probe_size(path) {
            Ok(size) => size,
            Err(err) => {
                diag.warn(&format!("Can't read {}", path.display()));
                diag.warn(&format!("({:?})", err.kind()));
                0
            }
        }
    }

    fn matches_exclude(&self, path: &Path) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|re| re.is_match(&path.to_string_lossy()))
    }
}

/// Add `size` to `path`'s aggregate and to every ancestor up to and
/// including `root`.
///
/// Terminates at the root even when the root is the filesystem root, where
/// stripping another component would yield the same path forever.
pub(crate) fn propagate_size(sizes: &mut PathSizeMap, path: &Path, root: &Path, size: u64) {
    let mut cur = path;
    loop {
        *sizes.entry(cur.to_path_buf()).or_insert(0) += size;
        if cur == root {
            break;
        }
        match cur.parent() {
            Some(parent) if parent.starts_with(root) => cur = parent,
            _ => break,
        }
    }
}
