//! Configuration for the tree walker

use std::time::Duration;

use super::filetype::SpecialTypes;

/// Knobs for a single scan.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Literal substring pruned from traversal (matched against full paths).
    pub exclude: Option<String>,
    /// Directory names pruned when scanning from the filesystem root,
    /// typically remote-mount roots like `Volumes`.
    pub mount_excludes: Vec<String>,
    /// Which special file types to skip during collection.
    pub skip_special: SpecialTypes,
    /// How long the traversal may go without progress before the watchdog
    /// kills the process.
    pub watchdog_timeout: Duration,
    /// Entries between progress diagnostics and watchdog resets.
    pub progress_interval: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            exclude: None,
            mount_excludes: vec!["Volumes".to_string()],
            skip_special: SpecialTypes::default(),
            watchdog_timeout: Duration::from_secs(20),
            progress_interval: 1000,
        }
    }
}
