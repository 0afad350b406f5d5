//! Error types for custvault-sync.

use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

use custvault_template::TemplateError;

/// All errors that can arise from snapshot, diff and write-back operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the template layer.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The configured structure root does not exist; no diff is attempted.
    #[error("structure root {path} does not exist")]
    MissingExpectedRoot { path: PathBuf },

    /// A regular file sits where a directory has to be created.
    #[error("{path} exists but is not a directory")]
    PathConflict { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// `NotFound`, or a parent component that is a regular file.
pub(crate) fn is_absent(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
