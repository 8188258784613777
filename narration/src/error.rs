//! Error types for narration backends.

use thiserror::Error;

/// Result type alias for narration operations.
pub type Result<T> = std::result::Result<T, NarrationError>;

/// Errors raised while talking to a narration backend.
///
/// None of these escape [`crate::Narrator::generate`]; the remote narrator
/// retries on them and eventually falls back to an empty narration.
#[derive(Error, Debug)]
pub enum NarrationError {
    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The backend answered with something that is not a narration object.
    #[error("malformed narration output: {0}")]
    MalformedOutput(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
