//! Configuration for canon retrieval.

use serde::{Deserialize, Serialize};

use ghostwriter_canon::DEFAULT_SNIPPET_WINDOW;

/// How many results each retrieval strategy contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Snippets taken from the lexical index.
    pub lexical_top_k: usize,

    /// Chunks taken from the vector index.
    pub vector_top_k: usize,

    /// Snippet window size in characters.
    pub snippet_window: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_top_k: 2,
            vector_top_k: 1,
            snippet_window: DEFAULT_SNIPPET_WINDOW,
        }
    }
}

impl RetrievalConfig {
    /// Set the lexical result count.
    pub fn with_lexical_top_k(mut self, k: usize) -> Self {
        self.lexical_top_k = k;
        self
    }

    /// Set the vector result count.
    pub fn with_vector_top_k(mut self, k: usize) -> Self {
        self.vector_top_k = k;
        self
    }

    /// Set the snippet window size.
    pub fn with_snippet_window(mut self, window: usize) -> Self {
        self.snippet_window = window;
        self
    }
}
