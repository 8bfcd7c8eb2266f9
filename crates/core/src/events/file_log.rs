//! Append-only text file sink mirrored to the console
//!
//! Each record is written as `<timestamp> - <message>` on its own line. If the
//! file cannot be opened, or a later write fails, the sink degrades to
//! console-only output instead of stopping the simulation.

use super::{EventLog, EventRecord, FireEvent};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "fire_events.log";

/// Event sink writing to a file and (optionally) stdout
#[derive(Debug)]
pub struct FileEventLog {
    path: PathBuf,
    /// `None` once the sink has degraded to console-only
    file: Mutex<Option<File>>,
    mirror_to_console: bool,
}

impl FileEventLog {
    /// Open (or create) `path` for appending
    ///
    /// Never fails: an unopenable file leaves the sink in console-only mode
    /// and logs a warning.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(
                    "Could not open event log {}: {e}; continuing with console output only",
                    path.display()
                );
                None
            }
        };
        Self {
            path,
            file: Mutex::new(file),
            mirror_to_console: true,
        }
    }

    /// Enable or disable the stdout mirror
    pub fn with_console_mirror(mut self, enabled: bool) -> Self {
        self.mirror_to_console = enabled;
        self
    }

    /// Path this sink was opened with
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether records still reach the file
    pub fn is_file_backed(&self) -> bool {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn write_line(file: &mut File, line: &str) -> io::Result<()> {
        writeln!(file, "{line}")?;
        file.flush()
    }
}

impl EventLog for FileEventLog {
    fn emit(&self, event: FireEvent) {
        let line = EventRecord::now(event).to_string();

        // Held across the console write: both copies share one order
        let mut slot = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = slot.as_mut() {
            if let Err(e) = Self::write_line(file, &line) {
                warn!(
                    "Writing to event log {} failed: {e}; continuing with console output only",
                    self.path.display()
                );
                *slot = None;
            }
        }

        if self.mirror_to_console {
            // Ignore broken stdout; the file copy is the record of truth
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
    }
}
