//! Case-insensitive duplicate path finder
//!
//! A much simpler companion to the sizing scan: walk the tree, lowercase
//! every full path, and report any that collide. Useful before copying a
//! tree to a case-insensitive filesystem.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use crate::diag::Diag;

/// Result of a duplicate-name scan.
pub struct DupReport {
    /// Lowercased paths seen more than once, sorted.
    pub duplicates: Vec<String>,
    pub entries_processed: u64,
}

/// Collect the paths (lowercased) that occur more than once.
///
/// Pure over any path iterator so collisions can be detected even on a
/// filesystem that would never let both spellings exist at once.
pub fn collisions<I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut dups: BTreeSet<String> = BTreeSet::new();
    for path in paths {
        let lowered = path.to_lowercase();
        if !seen.insert(lowered.clone()) {
            dups.insert(lowered);
        }
    }
    dups.into_iter().collect()
}

/// Walk `root` and report case-insensitive duplicate paths beneath it.
pub fn find_case_dups(root: &Path, diag: &mut Diag) -> DupReport {
    let mut paths = Vec::new();
    collect_paths(root, &mut paths, diag);
    let entries_processed = paths.len() as u64 + 1;
    diag.progress_done(&format!("{} files processed.", entries_processed));

    DupReport {
        duplicates: collisions(paths),
        entries_processed,
    }
}

fn collect_paths(dir: &Path, paths: &mut Vec<String>, diag: &mut Diag) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut subdirs = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        paths.push(path.to_string_lossy().into_owned());
        if paths.len() % 1000 == 0 {
            diag.progress(&format!("{} files processed.", paths.len()));
        }
        if is_dir {
            subdirs.push(path);
        }
    }

    subdirs.sort();
    for sub in &subdirs {
        collect_paths(sub, paths, diag);
    }
}
