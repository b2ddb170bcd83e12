//! Error types for the DeFi trainer.
//!
//! Library crates use [`TrainerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all trainer operations.
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Knowledge-base document could not be decoded.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// A required field is absent on a knowledge-base record.
    #[error("{category}[{index}]: missing required field `{field}`")]
    MissingField {
        category: &'static str,
        index: usize,
        field: &'static str,
    },

    /// A knowledge-base field is present but has the wrong shape.
    #[error("{category}[{index}]: field `{field}` must be {expected}")]
    InvalidField {
        category: &'static str,
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    /// Network error, timeout, or HTTP client construction failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("{url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response body was not the JSON we expected.
    #[error("decode error: {0}")]
    Decode(String),

    /// The response decoded but carried no usable result.
    #[error("unexpected response shape: {0}")]
    Shape(String),

    /// Data validation error (serialization, invalid values, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrainerError>;

impl TrainerError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for TrainerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}
