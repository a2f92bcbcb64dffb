//! Error types for template compilation and rendering.
//!
//! This module provides [`RenderError`], the error type for everything below the
//! component layer: compiling sidecar or inline templates, rendering them, and
//! reading template files during discovery. It abstracts over the underlying
//! template engine's errors, providing a stable public API.

use std::path::PathBuf;

/// Error type for template operations.
///
/// This error type doesn't expose implementation details of the underlying
/// template engine. All handler and discovery functions return this type.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template syntax error or compilation failure.
    #[error("template error: {0}")]
    TemplateError(String),

    /// No handler is registered for a template file extension.
    #[error("no template handler registered for extension '{0}'")]
    UnknownHandler(String),

    /// Template not found.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Failed to read a template file from disk.
    #[error("failed to read template \"{}\": {source}", path.display())]
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside of a specific template file (e.g. listing a directory).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error converting locals into engine values.
    #[error("context error: {0}")]
    ContextError(String),

    /// Other operational error raised while rendering.
    #[error("{0}")]
    OperationError(String),
}

impl RenderError {
    /// Creates a read error for the given path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::ReadError {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::ContextError(err.to_string())
    }
}

// Conversion from minijinja::Error - this keeps internal compatibility
impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod => RenderError::TemplateError(err.to_string()),
            ErrorKind::BadSerialization => RenderError::ContextError(err.to_string()),
            _ => RenderError::OperationError(err.to_string()),
        }
    }
}
