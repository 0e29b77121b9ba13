//! Unified error types for the analytics engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the analytics engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A structural problem with an export member file (missing member,
    /// wrong columns, undecodable rows). Fatal for the whole run.
    #[error("error in import file {file}: {message}")]
    ImportFile { file: String, message: String },

    /// The import finished but accumulated critical row-level errors.
    #[error("{count} critical error(s) in import data")]
    ImportData { count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an import-file error for a named archive member.
    pub fn import_file(file: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ImportFile {
            file: file.into(),
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error means the archive itself is unusable, as opposed
    /// to bad rows inside an otherwise well-formed archive.
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::ImportFile { .. })
    }
}
