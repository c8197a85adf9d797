//! Error types for reqminer.
//!
//! Library crates use [`ReqMinerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all reqminer operations.
#[derive(Debug, thiserror::Error)]
pub enum ReqMinerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Inference endpoint error (transport, timeout, non-2xx, bad body).
    #[error("inference error: {0}")]
    Inference(String),

    /// A source document could not be read or decoded.
    #[error("document error at {path:?}: {message}")]
    Document { path: PathBuf, message: String },

    /// Model profile store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input or configuration values.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReqMinerError>;

impl ReqMinerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a document error for the file at `path`.
    pub fn document(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Document {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
