//! Threshold filtering, ranking, and report output

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::size::size_to_eng;
use crate::walk::PathSizeMap;

/// Width of the size column: auto-scaled strings like `812.5MB` fit in 8,
/// raw kilobyte counts get one more.
const SIZE_WIDTH: usize = 8;
const SIZE_WIDTH_KILOBYTES: usize = 9;

/// Remove every entry strictly below `min_bytes`. Pure and idempotent;
/// runs before sorting so large trees sort less.
pub fn filter_below(sizes: &mut PathSizeMap, min_bytes: u64) {
    sizes.retain(|_, size| *size >= min_bytes);
}

/// Order the map for reporting: size descending, ties by ascending path.
pub fn ranked(sizes: PathSizeMap) -> Vec<(PathBuf, u64)> {
    let mut entries: Vec<_> = sizes.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn size_field(bytes: u64, kilobytes: bool) -> (String, usize) {
    if kilobytes {
        (
            format!("{:.0}", bytes as f64 / 1024.0),
            SIZE_WIDTH_KILOBYTES,
        )
    } else {
        (format!("{}B", size_to_eng(bytes)), SIZE_WIDTH)
    }
}

fn dir_suffix(path: &Path, is_dir: bool) -> &'static str {
    // the filesystem root already ends with the separator
    if is_dir && path.parent().is_some() {
        std::path::MAIN_SEPARATOR_STR
    } else {
        ""
    }
}

/// Render one report line: right-justified size, a space, then the path,
/// directories suffixed with the platform separator.
pub fn entry_line(path: &Path, bytes: u64, kilobytes: bool, is_dir: bool) -> String {
    let (size_str, width) = size_field(bytes, kilobytes);
    format!(
        "{:>width$} {}{}",
        size_str,
        path.display(),
        dir_suffix(path, is_dir)
    )
}

/// Write the ranked entries as the text report.
///
/// Directory-ness is checked at print time, following symlinks, so the
/// suffix marks what the path looks like now. Write errors propagate so a
/// closed pager pipe surfaces distinctly.
pub fn write_entries<W: WriteColor>(
    out: &mut W,
    entries: &[(PathBuf, u64)],
    kilobytes: bool,
) -> io::Result<()> {
    for (path, bytes) in entries {
        let is_dir = path.is_dir();
        let (size_str, width) = size_field(*bytes, kilobytes);
        write!(out, "{:>width$} ", size_str)?;
        if is_dir {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
            write!(out, "{}{}", path.display(), dir_suffix(path, is_dir))?;
            out.reset()?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    path: &'a Path,
    bytes: u64,
    human: String,
}

/// Write the ranked entries as a JSON array.
pub fn write_json<W: Write>(out: &mut W, entries: &[(PathBuf, u64)]) -> io::Result<()> {
    let rows: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|(path, bytes)| JsonEntry {
            path,
            bytes: *bytes,
            human: size_to_eng(*bytes),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}
