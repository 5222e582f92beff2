//! Depth-first tree walking and size aggregation

mod config;
mod cursor;
mod filetype;
mod walker;

use std::collections::HashMap;
use std::path::PathBuf;

pub use config::WalkConfig;
pub use cursor::TraversalCursor;
pub use filetype::{SpecialTypes, is_skippable};
pub use walker::{TreeWalker, WalkReport};

/// Cumulative allocated byte count per path. A directory's entry covers its
/// own descriptor plus everything transitively beneath it.
pub type PathSizeMap = HashMap<PathBuf, u64>;
