//! Errors raised while embedding text or searching a vector index.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No usable backend: missing API key or disabled provider.
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// The backend answered with a non-success status.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The backend answered, but not with one vector per input.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// A query vector does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
