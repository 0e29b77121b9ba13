//! Error log files for import runs.
//!
//! Accumulated row errors are deduplicated and written to a timestamped
//! file per stream (critical / non-critical) so an operator can audit a
//! run after the fact; the run summary carries only a bounded sample.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use analytics_core::Result;

/// Default number of errors quoted inline in the run summary.
pub const DEFAULT_ERROR_SAMPLE_SIZE: usize = 20;

/// Writes import error logs under a fixed directory.
#[derive(Debug, Clone)]
pub struct ErrorLogWriter {
    dir: PathBuf,
}

impl ErrorLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the critical error log. Returns the path written.
    pub fn write_errors(
        &self,
        errors: &BTreeSet<String>,
        log_time: DateTime<Utc>,
    ) -> Result<PathBuf> {
        self.write_log("errors_", errors, log_time)
    }

    /// Writes the non-critical error log. Returns the path written.
    pub fn write_non_critical_errors(
        &self,
        errors: &BTreeSet<String>,
        log_time: DateTime<Utc>,
    ) -> Result<PathBuf> {
        self.write_log("non_critical_errors_", errors, log_time)
    }

    fn write_log(
        &self,
        prefix: &str,
        errors: &BTreeSet<String>,
        log_time: DateTime<Utc>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let filename = format!("{}{}", prefix, log_time.format("%Y-%m-%dT%H-%M-%S"));
        let path = self.dir.join(filename);
        let mut file = File::create(&path)?;
        for error in errors {
            writeln!(file, "{}", error)?;
        }
        warn!(path = %path.display(), count = errors.len(), "wrote import error log");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Deduplicates an error stream, keeping a stable order for reporting.
pub fn dedup_errors(errors: Vec<String>) -> BTreeSet<String> {
    errors.into_iter().collect()
}

/// Takes the first `n` errors for inline reporting.
pub fn sample(errors: &BTreeSet<String>, n: usize) -> Vec<&str> {
    errors.iter().take(n).map(String::as_str).collect()
}
