//! Error types for custvault-template.

use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the template layer.
///
/// Syntax problems inside a template are never errors; they are reported as
/// [`crate::Issue`]s by [`crate::validate`].
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Filesystem error while loading a template.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A custom variable tried to take a built-in name.
    #[error("'{name}' is a built-in variable and cannot be overridden")]
    ReservedVariable { name: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
