//! CLI entry point for heft

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Component, Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use termcolor::{ColorChoice, StandardStream};

use heft::{
    Diag, SpecialTypes, TraversalCursor, TreeWalker, WalkConfig, Watchdog, filter_below,
    find_case_dups, parse_size, ranked, size_to_eng, write_entries, write_json,
};

/// Stdout consumer went away (e.g. a pager quit).
const EXIT_BROKEN_PIPE: i32 = 3;
/// Conventional status for death by SIGINT.
const EXIT_INTERRUPT: i32 = 130;

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            // Respect FORCE_COLOR environment variable
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            // Respect TERM=dumb
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            // Check if stdout is a TTY
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "heft")]
#[command(about = "Search a path for the directories and files taking the most space and rank them")]
#[command(version)]
struct Args {
    /// Search path (recursively scanned)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Report only entries of at least SIZE bytes.
    /// Units: 2k, 2K, 1m, 1M, 2g, 2G, 1T, etc.
    #[arg(short = 't', long = "thresh", value_name = "SIZE")]
    thresh: Option<String>,

    /// Report sizes as plain kilobyte counts
    #[arg(short = 'k')]
    kilobyte: bool,

    /// Prune paths containing this literal substring
    #[arg(short = 'x', long = "exclude", value_name = "SUBSTR")]
    exclude: Option<String>,

    /// Abort if traversal makes no progress for this long
    #[arg(
        long = "watchdog-timeout",
        value_name = "DURATION",
        default_value = "20s"
    )]
    watchdog_timeout: String,

    /// Directory name pruned when scanning from the filesystem root
    /// (repeatable; default: Volumes)
    #[arg(long = "mount-exclude", value_name = "NAME")]
    mount_exclude: Vec<String>,

    /// Disable the default mount-root pruning
    #[arg(long = "no-mount-excludes", conflicts_with = "mount_exclude")]
    no_mount_excludes: bool,

    /// Size named pipes and sockets instead of skipping them
    #[arg(long = "include-special")]
    include_special: bool,

    /// Output the ranked entries as JSON
    #[arg(long = "json")]
    json: bool,

    /// Find case-insensitive duplicate paths instead of sizing
    #[arg(long = "dup-names")]
    dup_names: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,
}

fn main() {
    let args = Args::parse();

    let choice = if should_use_color(args.color) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut diag = Diag::new(choice);

    let timeout = match humantime::parse_duration(&args.watchdog_timeout) {
        Ok(t) => t,
        Err(e) => {
            eprintln!(
                "heft: invalid --watchdog-timeout '{}': {}",
                args.watchdog_timeout, e
            );
            process::exit(2);
        }
    };

    let root = normalize_path(&args.path);

    let result = if args.dup_names {
        run_dups(&root, &mut diag, choice)
    } else {
        run_scan(&args, &root, timeout, &mut diag, choice)
    };

    match result {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            diag.line("Broken pipe");
            process::exit(EXIT_BROKEN_PIPE);
        }
        Err(e) => {
            eprintln!("heft: error writing output: {}", e);
            process::exit(1);
        }
    }
}

/// The sizing scan: header, walk, filter, sort, print, timing summary.
fn run_scan(
    args: &Args,
    root: &Path,
    timeout: Duration,
    diag: &mut Diag,
    choice: ColorChoice,
) -> io::Result<()> {
    let threshold = match &args.thresh {
        Some(s) => match parse_size(s) {
            Ok(n) => n,
            Err(e) => {
                eprintln!("heft: invalid --thresh '{}': {}", s, e);
                process::exit(2);
            }
        },
        None => 0,
    };

    let mut out = StandardStream::stdout(choice);

    if !args.json {
        writeln!(out, "{}", header_line(root))?;
        writeln!(out, "{}", timestamp_line())?;
        if threshold > 0 {
            writeln!(out, "threshold={}B", size_to_eng(threshold))?;
        }
    }

    let config = WalkConfig {
        exclude: args.exclude.clone(),
        mount_excludes: mount_excludes(args),
        skip_special: if args.include_special {
            SpecialTypes::none()
        } else {
            SpecialTypes::default()
        },
        watchdog_timeout: timeout,
        ..Default::default()
    };

    let cursor = TraversalCursor::new();
    let watchdog = Watchdog::spawn(config.watchdog_timeout, cursor.clone());
    install_interrupt_handler(watchdog.clone(), diag);

    let start = Instant::now();
    let mut walker = TreeWalker::new(config, cursor, watchdog);
    let report = walker.walk(root, diag);
    let catalog_done = Instant::now();

    if !args.json {
        writeln!(out, "{} files processed.", report.entries_processed)?;
    }

    // filter before sorting; dropping sub-threshold entries first keeps the
    // sort cheap on big trees
    let mut sizes = report.sizes;
    if threshold > 0 {
        diag.line("filtering by size...");
        filter_below(&mut sizes, threshold);
    }

    diag.line("sorting...");
    let sort_start = Instant::now();
    let entries = ranked(sizes);

    let print_start = Instant::now();
    diag.line("printing report...");
    if args.json {
        write_json(&mut out, &entries)?;
    } else {
        write_entries(&mut out, &entries, args.kilobyte)?;
    }
    let finish = Instant::now();

    if !args.json {
        let elapsed = (finish - start).as_secs_f64();
        diag.line(&format!("Elapsed time: {:.0}s", elapsed));

        writeln!(out)?;
        writeln!(out, "Elapsed time: {:.0}s", elapsed)?;
        writeln!(
            out,
            "    File Cataloging elapsed time: {:.0}s",
            (catalog_done - start).as_secs_f64()
        )?;
        if threshold > 0 {
            writeln!(
                out,
                "    Filtering elapsed time: {:.0}s",
                (sort_start - catalog_done).as_secs_f64()
            )?;
        }
        writeln!(
            out,
            "    Sorting elapsed time: {:.0}s",
            (print_start - sort_start).as_secs_f64()
        )?;
        writeln!(
            out,
            "    Report Printing elapsed time: {:.0}s",
            (finish - print_start).as_secs_f64()
        )?;
    }
    Ok(())
}

/// The duplicate-name scan: header, walk, report collisions.
fn run_dups(root: &Path, diag: &mut Diag, choice: ColorChoice) -> io::Result<()> {
    let mut out = StandardStream::stdout(choice);
    writeln!(out, "{}", header_line(root))?;
    writeln!(out, "{}", timestamp_line())?;

    let start = Instant::now();
    let report = find_case_dups(root, diag);
    writeln!(out, "{} files processed.", report.entries_processed)?;
    for dup in &report.duplicates {
        writeln!(out, "{}", dup)?;
    }

    let elapsed = start.elapsed().as_secs_f64();
    diag.line(&format!("Elapsed time: {:.0}s", elapsed));
    writeln!(out, "Elapsed time: {:.0}s", elapsed)?;
    Ok(())
}

/// Cancel the watchdog and exit 130 on Ctrl-C, so a fatal-timeout
/// diagnostic can never race normal shutdown.
fn install_interrupt_handler(watchdog: Watchdog, diag: &mut Diag) {
    let result = ctrlc::set_handler(move || {
        watchdog.cancel();
        eprintln!("\nStopped by Keyboard Interrupt");
        process::exit(EXIT_INTERRUPT);
    });
    if result.is_err() {
        // scan on regardless; the default signal disposition still stops us
        diag.warn("heft: could not install interrupt handler");
    }
}

fn mount_excludes(args: &Args) -> Vec<String> {
    if args.no_mount_excludes {
        Vec::new()
    } else if args.mount_exclude.is_empty() {
        WalkConfig::default().mount_excludes
    } else {
        args.mount_exclude.clone()
    }
}

/// First report line: program name, the flags it was invoked with, and the
/// absolute root being scanned.
fn header_line(root: &Path) -> String {
    let argv: Vec<String> = env::args().collect();
    let program = argv
        .first()
        .map(|a| {
            Path::new(a)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| a.clone())
        })
        .unwrap_or_else(|| "heft".to_string());
    let flags = if argv.len() > 2 {
        argv[1..argv.len() - 1].join(" ")
    } else {
        String::new()
    };
    let abs = absolute_path(root);
    if flags.is_empty() {
        format!("{} {}", program, abs.display())
    } else {
        format!("{} {} {}", program, flags, abs.display())
    }
}

fn timestamp_line() -> String {
    chrono::Local::now()
        .format("%a %b %d %Y   %I:%M%p")
        .to_string()
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| normalize_path(&cwd.join(path)))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Lexically normalize a path: drop `.` components, collapse `..` against
/// named components, strip redundant separators.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // /.. collapses to /
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_drops_cur_dir() {
        assert_eq!(normalize_path(Path::new("./a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_normalize_path_collapses_parent_dirs() {
        assert_eq!(normalize_path(Path::new("a/b/..")), PathBuf::from("a"));
        assert_eq!(normalize_path(Path::new("a/../b")), PathBuf::from("b"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn test_normalize_path_keeps_root() {
        assert_eq!(normalize_path(Path::new("/")), PathBuf::from("/"));
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize_path(Path::new("/a/../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_normalize_path_trailing_slash() {
        assert_eq!(normalize_path(Path::new("a/b/")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_mount_excludes_default_and_overrides() {
        let mut args = Args::parse_from(["heft"]);
        assert_eq!(mount_excludes(&args), vec!["Volumes".to_string()]);

        args.mount_exclude = vec!["net".to_string(), "mnt".to_string()];
        assert_eq!(
            mount_excludes(&args),
            vec!["net".to_string(), "mnt".to_string()]
        );

        args.mount_exclude.clear();
        args.no_mount_excludes = true;
        assert!(mount_excludes(&args).is_empty());
    }
}
