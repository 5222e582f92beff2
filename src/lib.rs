//! Heft - ranks the files and directories taking the most disk space

pub mod diag;
pub mod dups;
pub mod platform;
pub mod report;
pub mod size;
pub mod walk;
pub mod watchdog;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use diag::Diag;
pub use dups::{DupReport, find_case_dups};
pub use report::{entry_line, filter_below, ranked, write_entries, write_json};
pub use size::{parse_size, probe_size, size_to_eng};
pub use walk::{
    PathSizeMap, SpecialTypes, TraversalCursor, TreeWalker, WalkConfig, WalkReport,
};
pub use watchdog::Watchdog;
