//! Per-run logging sink.
//!
//! One `RunLogger` is constructed per pipeline or cleanup run and handed to
//! the collaborators that need it. Lines go to the run's log file; progress
//! is mirrored to stderr when stderr is a terminal, warnings and errors
//! always. The sink is flushed on drop so every exit path releases it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

pub struct RunLogger {
    file: Mutex<BufWriter<File>>,
    warnings: Mutex<Vec<String>>,
}

impl RunLogger {
    /// Open (or append to) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                Error::internal_io(
                    format!("Failed to open log file {}: {}", path.display(), e),
                    Some("create run logger".to_string()),
                )
            })?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            warnings: Mutex::new(Vec::new()),
        })
    }

    pub fn info(&self, stage: &str, message: impl AsRef<str>) {
        self.write(Level::Info, stage, message.as_ref());
    }

    pub fn warn(&self, stage: &str, message: impl AsRef<str>) {
        let message = message.as_ref();
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(format!("[{}] {}", stage, message));
        }
        self.write(Level::Warn, stage, message);
    }

    /// Warnings accumulated so far, for inclusion in run summaries.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn error(&self, stage: &str, message: impl AsRef<str>) {
        self.write(Level::Error, stage, message.as_ref());
    }

    fn write(&self, level: Level, stage: &str, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if let Ok(mut file) = self.file.lock() {
            // Log file write failures must never take down the run itself.
            let _ = writeln!(
                file,
                "{} {} [{}] {}",
                timestamp,
                level.as_str(),
                stage,
                message
            );
        }

        let mirror = match level {
            Level::Info => std::io::stderr().is_terminal(),
            Level::Warn | Level::Error => true,
        };
        if mirror {
            match level {
                Level::Info => eprintln!("[{}] {}", stage, message),
                Level::Warn => eprintln!("[{}] warning: {}", stage, message),
                Level::Error => eprintln!("[{}] error: {}", stage, message),
            }
        }
    }

    pub fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
