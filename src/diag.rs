//! Stderr diagnostics with same-line progress updates
//!
//! Progress counts overwrite themselves with `\r`; warnings and notes that
//! arrive while a progress line is pending move to a fresh line first so the
//! count stays visible.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Diagnostic printer for the stderr stream.
///
/// All writes are best-effort: a failing stderr must never abort a scan.
pub struct Diag {
    stream: StandardStream,
    progress_pending: bool,
}

impl Diag {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stderr(choice),
            progress_pending: false,
        }
    }

    /// Print a plain message line.
    pub fn line(&mut self, msg: &str) {
        self.break_progress();
        let _ = writeln!(self.stream, "{}", msg);
    }

    /// Print a warning line (yellow when color is enabled).
    pub fn warn(&mut self, msg: &str) {
        self.break_progress();
        let _ = self
            .stream
            .set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(self.stream, "{}", msg);
        let _ = self.stream.reset();
    }

    /// Overwrite the current progress line, staying on the same line.
    pub fn progress(&mut self, msg: &str) {
        let _ = write!(self.stream, "\r{}", msg);
        let _ = self.stream.flush();
        self.progress_pending = true;
    }

    /// Overwrite the progress line one final time and terminate it.
    pub fn progress_done(&mut self, msg: &str) {
        let _ = writeln!(self.stream, "\r{}", msg);
        self.progress_pending = false;
    }

    fn break_progress(&mut self) {
        if self.progress_pending {
            let _ = writeln!(self.stream);
            self.progress_pending = false;
        }
    }
}

impl Default for Diag {
    fn default() -> Self {
        Self::new(ColorChoice::Never)
    }
}
