//! Slice progress reporting.
//!
//! All console status output of a run goes through a [`ProgressReporter`].
//! The console reporter writes to stderr, with colors when stderr is a
//! terminal.
//!
//! # Example
//!
//! ```ignore
//! use thumbslice::slice::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::MissionCompleted { mission_id: 1, written: 4 });
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::cell::{CellId, VARIANT_COUNT};
use crate::region::Strategy;
use crate::slice::result::SkipReason;

/// Events that can be reported during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The source was copied from its fallback location
    SourceCopied { from: PathBuf, to: PathBuf },
    /// Processing started
    RunStarted {
        strategy: Strategy,
        source: PathBuf,
        width: u32,
        height: u32,
        total_cells: usize,
    },
    /// A thumbnail was written (only sent to verbose reporters)
    CellWritten { cell: CellId, path: PathBuf },
    /// A cell was skipped
    CellSkipped { cell: CellId, reason: SkipReason },
    /// All variants of a mission were processed
    MissionCompleted {
        mission_id: u32,
        /// Thumbnails written for this mission (out of 4)
        written: usize,
    },
    /// Run finished
    RunCompleted {
        written: usize,
        expected: usize,
        out_dir: PathBuf,
        duration_ms: u64,
    },
    /// A non-fatal problem not tied to a single cell
    Warning { message: String },
    /// A fatal error
    Error { message: String },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    /// Suppress per-mission lines; warnings and the summary still print
    quiet: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            quiet: false,
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false, // Disable colors for custom output
            verbose: false,
            quiet: false,
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn bold(&self, text: &str) -> String {
        self.color(text, "\x1b[1m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SourceCopied { from, to } => {
                if !self.quiet {
                    self.writeln(&format!(
                        "{} Copied sprite sheet {} -> {}",
                        self.cyan("[slice]"),
                        from.display(),
                        to.display()
                    ));
                }
            }
            ProgressEvent::RunStarted { strategy, source, width, height, total_cells } => {
                if !self.quiet {
                    self.writeln(&format!(
                        "{} Slicing {} ({}x{}) into {} cells using {} regions...",
                        self.cyan("[slice]"),
                        source.display(),
                        width,
                        height,
                        total_cells,
                        strategy
                    ));
                }
            }
            ProgressEvent::CellWritten { cell, path } => {
                if self.verbose && !self.quiet {
                    self.writeln(&format!(
                        "{} {} -> {}",
                        self.cyan("[slice]"),
                        cell,
                        path.display()
                    ));
                }
            }
            ProgressEvent::CellSkipped { cell, reason } => {
                self.writeln(&format!(
                    "{} {}: {}, skipped",
                    self.yellow("[warn]"),
                    cell.frame_key(),
                    reason
                ));
            }
            ProgressEvent::MissionCompleted { mission_id, written } => {
                if !self.quiet {
                    let status = if written == VARIANT_COUNT as usize {
                        self.green("ok")
                    } else {
                        self.yellow("partial")
                    };
                    self.writeln(&format!(
                        "{} mission {:>2}: {} ({}/{} variants: fail, bronze, silver, gold)",
                        self.cyan("[slice]"),
                        mission_id,
                        status,
                        written,
                        VARIANT_COUNT
                    ));
                }
            }
            ProgressEvent::RunCompleted { written, expected, out_dir, duration_ms } => {
                let skipped = expected.saturating_sub(written);
                let skipped_str =
                    if skipped > 0 { format!(", {} skipped", skipped) } else { String::new() };
                self.writeln(&format!(
                    "\n{} {}/{} thumbnails written to {}{} in {}",
                    self.green("[done]"),
                    self.bold(&written.to_string()),
                    expected,
                    out_dir.display(),
                    skipped_str,
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::Warning { message } => {
                self.writeln(&format!("{} {}", self.yellow("[warn]"), message));
            }
            ProgressEvent::Error { message } => {
                self.writeln(&format!("{} {}", self.red("[error]"), message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }
}

/// Format a duration in milliseconds to a human-readable string.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

/// Test writer that captures output into a shared buffer.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CaptureWriter(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CaptureWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub(crate) fn contents(&self) -> String {
        self.0.lock().map(|buf| String::from_utf8_lossy(&buf).into_owned()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
