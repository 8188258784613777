//! Retrieval aggregation over the lexical and vector indexes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use ghostwriter_canon::CanonIndex;
use ghostwriter_embeddings::{EmbeddingIndex, EmbeddingProvider, ScoredChunk};

use crate::config::RetrievalConfig;
use crate::error::Result;

/// Query both indexes concurrently and return lexical snippets followed by
/// vector chunk texts.
///
/// Each list keeps its own ranking order and nothing is deduplicated. A
/// missing vector index or embedder, or a failing vector search, only
/// removes the vector part.
pub async fn retrieve(
    query: &str,
    canon: &CanonIndex,
    vectors: Option<&EmbeddingIndex>,
    embedder: Option<&dyn EmbeddingProvider>,
    config: &RetrievalConfig,
) -> Vec<String> {
    let lexical = async {
        canon.search_with_window(query, config.lexical_top_k, config.snippet_window)
    };
    let semantic = vector_texts(query, vectors, embedder, config.vector_top_k);

    let (mut snippets, semantic) = tokio::join!(lexical, semantic);
    debug!(
        "Retrieved {} lexical and {} vector snippets",
        snippets.len(),
        semantic.len()
    );
    snippets.extend(semantic);
    snippets
}

async fn vector_texts(
    query: &str,
    vectors: Option<&EmbeddingIndex>,
    embedder: Option<&dyn EmbeddingProvider>,
    top_k: usize,
) -> Vec<String> {
    let Some(index) = vectors else {
        return Vec::new();
    };
    match index.search(embedder, query, top_k).await {
        Ok(hits) => hits.into_iter().map(|hit| hit.chunk.text).collect(),
        Err(e) => {
            warn!("Vector search failed, continuing without it: {e}");
            Vec::new()
        }
    }
}

/// Results of an explicit lore lookup.
#[derive(Debug, Clone, Default)]
pub struct LoreResults {
    /// Lexical snippets.
    pub canon: Vec<String>,

    /// Vector hits with their scores.
    pub vectors: Vec<ScoredChunk>,
}

impl LoreResults {
    pub fn is_empty(&self) -> bool {
        self.canon.is_empty() && self.vectors.is_empty()
    }
}

/// Statistics about the loaded indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverStats {
    /// Number of canon documents.
    pub canon_documents: usize,

    /// Number of embedded chunks, `None` without a vector index.
    pub embedding_chunks: Option<usize>,
}

/// Owns the current indexes and swaps them on reload.
///
/// Searches take a snapshot of the `Arc`s first, so a reload never affects
/// a search already in flight.
pub struct Retriever {
    /// Configuration.
    config: RetrievalConfig,

    /// Lexical index.
    canon: RwLock<Arc<CanonIndex>>,

    /// Vector index, if one was loaded.
    vectors: RwLock<Option<Arc<EmbeddingIndex>>>,

    /// Query embedder.
    embedder: Option<Arc<dyn EmbeddingProvider>>,

    /// Files under the canon root that reloads must not index.
    canon_exclusions: Vec<PathBuf>,
}

impl Retriever {
    pub fn new(canon: CanonIndex, config: RetrievalConfig) -> Self {
        Self {
            config,
            canon: RwLock::new(Arc::new(canon)),
            vectors: RwLock::new(None),
            embedder: None,
            canon_exclusions: Vec::new(),
        }
    }

    /// Set the vector index.
    pub fn with_embeddings(mut self, index: Option<EmbeddingIndex>) -> Self {
        self.vectors = RwLock::new(index.map(Arc::new));
        self
    }

    /// Set the embedding backend used for queries.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Skip `paths` when reloading canon, e.g. a vector index stored
    /// inside the canon directory.
    pub fn with_canon_exclusions(mut self, paths: Vec<PathBuf>) -> Self {
        self.canon_exclusions = paths;
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Current lexical index.
    pub async fn canon(&self) -> Arc<CanonIndex> {
        self.canon.read().await.clone()
    }

    /// Current vector index.
    pub async fn embeddings(&self) -> Option<Arc<EmbeddingIndex>> {
        self.vectors.read().await.clone()
    }

    /// Retrieve context snippets for `query`.
    pub async fn retrieve(&self, query: &str) -> Vec<String> {
        let canon = self.canon().await;
        let vectors = self.embeddings().await;
        retrieve(
            query,
            &canon,
            vectors.as_deref(),
            self.embedder.as_deref(),
            &self.config,
        )
        .await
    }

    /// Look up lore, keeping vector scores.
    pub async fn lore(&self, query: &str, top_k: usize) -> LoreResults {
        let canon = self.canon().await;
        let vectors = self.embeddings().await;

        let lexical = async { canon.search_with_window(query, top_k, self.config.snippet_window) };
        let semantic = async {
            match vectors.as_deref() {
                Some(index) => index
                    .search(self.embedder.as_deref(), query, top_k)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Vector lore lookup failed: {e}");
                        Vec::new()
                    }),
                None => Vec::new(),
            }
        };

        let (canon, vectors) = tokio::join!(lexical, semantic);
        LoreResults { canon, vectors }
    }

    /// Replace the lexical index.
    pub async fn replace_canon(&self, canon: CanonIndex) {
        *self.canon.write().await = Arc::new(canon);
    }

    /// Replace the vector index.
    pub async fn replace_embeddings(&self, index: Option<EmbeddingIndex>) {
        *self.vectors.write().await = index.map(Arc::new);
    }

    /// Reload the lexical index from `root`. Returns the document count.
    pub async fn reload_canon(&self, root: impl AsRef<Path>) -> Result<usize> {
        let root: PathBuf = root.as_ref().to_path_buf();
        let excluded = self.canon_exclusions.clone();
        let canon =
            tokio::task::spawn_blocking(move || CanonIndex::load_excluding(root, &excluded))
                .await?;
        let count = canon.len();
        self.replace_canon(canon).await;
        info!("Reloaded canon with {count} documents");
        Ok(count)
    }

    /// Reload the vector index from `path`. Returns whether one was loaded.
    pub async fn reload_embeddings(&self, path: impl AsRef<Path>) -> bool {
        let index = EmbeddingIndex::load(path).await;
        let loaded = index.is_some();
        self.replace_embeddings(index).await;
        loaded
    }

    /// Get engine statistics.
    pub async fn stats(&self) -> RetrieverStats {
        RetrieverStats {
            canon_documents: self.canon.read().await.len(),
            embedding_chunks: self.vectors.read().await.as_ref().map(|index| index.len()),
        }
    }
}
