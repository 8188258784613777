//! Error types for the canon crate.

use thiserror::Error;

/// Result type alias for canon operations.
pub type Result<T> = std::result::Result<T, CanonError>;

/// Errors that can occur while reading canon material or seed data.
///
/// Loading is best-effort: most of these are logged and skipped by the
/// loaders rather than returned to the caller.
#[derive(Error, Debug)]
pub enum CanonError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File is not valid UTF-8 text.
    #[error("not a text file: {0}")]
    NotText(String),
}
