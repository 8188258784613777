//! # Embeddings
//!
//! Dense vector support for canon retrieval.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to vectors through an OpenAI-compatible API
//! - **Similarity Search**: Rank chunks by cosine similarity
//! - **Persisted Index**: Build once offline, load best-effort at runtime
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  IndexBuilder ──► EmbeddingProvider ──► EmbeddingIndex (JSON)   │
//! │                          │                    │                 │
//! │                          ▼                    ▼                 │
//! │                   OpenAIProvider       cosine_similarity        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use builder::{ChunkingConfig, DEFAULT_CHUNK_SIZE, IndexBuilder, TextChunk, chunk_text};
pub use error::{EmbeddingError, Result};
pub use index::{EmbeddingChunk, EmbeddingIndex, ScoredChunk};
pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, EmbeddingConfig, EmbeddingProvider,
    OpenAIProvider,
};
pub use similarity::{SIMILARITY_EPSILON, cosine_similarity, rank_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
