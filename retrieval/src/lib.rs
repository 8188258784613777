//! # Retrieval
//!
//! Gathers canon context for a narration turn:
//!
//! - **Lexical**: term-occurrence search over the canon corpus
//! - **Vector**: cosine ranking over the embedding index
//! - **Web search**: optional research collaborator
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Retriever                         │
//! ├──────────────────────────────────────────────────────────┤
//! │   query ──┬──► CanonIndex::search ──────┐                │
//! │           │                              ├──► snippets    │
//! │           └──► EmbeddingIndex::search ──┘   (lexical     │
//! │                  (tokio::join!)              then vector) │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ghostwriter_retrieval::{RetrievalConfig, Retriever};
//!
//! let retriever = Retriever::new(CanonIndex::load("canon"), RetrievalConfig::default())
//!     .with_embeddings(EmbeddingIndex::load("embeddings.index.json").await);
//!
//! let snippets = retriever.retrieve("the drowned bell").await;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod web_search;

pub use config::RetrievalConfig;
pub use engine::{LoreResults, Retriever, RetrieverStats, retrieve};
pub use error::{Result, RetrievalError};
pub use web_search::{TAVILY_ENDPOINT, TavilySearch, WebSearchProvider, WebSearchResult};
