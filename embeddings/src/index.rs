//! Persisted chunk index for vector search.
//!
//! The whole index lives in one JSON object:
//!
//! ```text
//! { "model": "...", "updatedAt": "...", "docs": [ { id, source, offset, length, text, vector } ] }
//! ```
//!
//! It is produced by the offline `IndexBuilder` and only ever replaced as a
//! whole.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;
use crate::similarity::rank_top_k;

/// A chunk of canon text with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingChunk {
    /// Identifier, unique within the index.
    pub id: String,

    /// Source file, relative to the indexed directory.
    pub source: String,

    /// Character offset of the chunk in its source.
    pub offset: usize,

    /// Length of the chunk in characters.
    pub length: usize,

    /// The chunk text.
    pub text: String,

    /// The embedding vector.
    pub vector: Embedding,
}

/// A chunk returned by a search, with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: EmbeddingChunk,
    pub score: f32,
}

/// The persisted embedding index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingIndex {
    /// Model the vectors were produced with.
    pub model: String,

    /// When the index was built.
    pub updated_at: DateTime<Utc>,

    /// Chunks in build order.
    #[serde(rename = "docs")]
    pub chunks: Vec<EmbeddingChunk>,
}

impl EmbeddingIndex {
    /// Create an index stamped with the current time.
    pub fn new(model: impl Into<String>, chunks: Vec<EmbeddingChunk>) -> Self {
        Self {
            model: model.into(),
            updated_at: Utc::now(),
            chunks,
        }
    }

    /// Load an index from disk.
    ///
    /// A missing file, unparsable JSON or vectors of mixed dimensionality all
    /// yield `None`.
    pub async fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No embedding index at {}: {e}", path.display());
                return None;
            }
        };

        match Self::from_json(&content) {
            Ok(index) => {
                info!(
                    "Loaded embedding index with {} chunks from {}",
                    index.len(),
                    path.display()
                );
                Some(index)
            }
            Err(e) => {
                warn!("Ignoring embedding index {}: {e}", path.display());
                None
            }
        }
    }

    /// Parse and check an index.
    pub fn from_json(json: &str) -> Result<Self> {
        let index: Self = serde_json::from_str(json)?;
        index.check_dimensions()?;
        Ok(index)
    }

    /// Serialize the index to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the index to disk, replacing any previous file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_json()?;

        // Write atomically using a temp file
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, path).await?;

        info!("Saved {} chunks to {}", self.len(), path.display());
        Ok(())
    }

    /// Shared vector dimensionality, `None` for an empty index.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.vector.len())
    }

    /// Get the number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Rank chunks against an already embedded query.
    pub fn search_by_vector(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let Some(dimension) = self.dimension() else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let ranked = rank_top_k(query, self.chunks.iter().map(|c| c.vector.as_slice()), top_k)?;
        Ok(ranked
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: self.chunks[position].clone(),
                score,
            })
            .collect())
    }

    /// Embed `query` with `embedder` and rank chunks against it.
    ///
    /// Without an available embedder, or for an empty query or index, the
    /// result is empty rather than an error.
    pub async fn search(
        &self,
        embedder: Option<&dyn EmbeddingProvider>,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let Some(embedder) = embedder.filter(|e| e.is_available()) else {
            debug!("No embedding backend configured, skipping vector search");
            return Ok(Vec::new());
        };
        if query.trim().is_empty() || self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        if embedder.model() != self.model {
            warn!(
                "Query model {} differs from index model {}",
                embedder.model(),
                self.model
            );
        }

        let query_vector = embedder.embed_one(query).await?;
        self.search_by_vector(&query_vector, top_k)
    }

    fn check_dimensions(&self) -> Result<()> {
        let Some(dimension) = self.dimension() else {
            return Ok(());
        };
        match self.chunks.iter().find(|c| c.vector.len() != dimension) {
            Some(chunk) => Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: chunk.vector.len(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn chunk(id: &str, vector: Vec<f32>) -> EmbeddingChunk {
        EmbeddingChunk {
            id: id.to_string(),
            source: "lore.md".to_string(),
            offset: 0,
            length: 4,
            text: format!("text {id}"),
            vector,
        }
    }

    #[test]
    fn test_search_by_vector_orders_by_similarity() {
        let index = EmbeddingIndex::new(
            "m",
            vec![
                chunk("a", vec![0.0, 1.0]),
                chunk("b", vec![1.0, 0.0]),
                chunk("c", vec![0.7, 0.7]),
            ],
        );

        let results = index.search_by_vector(&[1.0, 0.0], 2).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_by_vector_rejects_wrong_dimension() {
        let index = EmbeddingIndex::new("m", vec![chunk("a", vec![1.0, 0.0])]);
        assert!(index.search_by_vector(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[tokio::test]
    async fn test_search_without_embedder_is_empty() {
        let index = EmbeddingIndex::new("m", vec![chunk("a", vec![1.0, 0.0])]);
        assert!(index.search(None, "query", 3).await.unwrap().is_empty());
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = r#"{"model":"m","updatedAt":"2024-05-01T10:00:00.000Z","docs":[
            {"id":"lore.md:0","source":"lore.md","offset":0,"length":2,"text":"hi","vector":[0.5,0.5]}
        ]}"#;
        let index = EmbeddingIndex::from_json(json).unwrap();
        assert_eq!(index.chunks[0].id, "lore.md:0");
        assert_eq!(index.dimension(), Some(2));

        let rendered = index.to_json().unwrap();
        assert!(rendered.contains("\"updatedAt\""));
        assert!(rendered.contains("\"docs\""));
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let index = EmbeddingIndex::new(
            "m",
            vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0])],
        );
        let json = index.to_json().unwrap();
        assert!(EmbeddingIndex::from_json(&json).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_and_garbage_files() {
        let dir = TempDir::new().unwrap();
        assert!(EmbeddingIndex::load(dir.path().join("none.json")).await.is_none());

        let garbage = dir.path().join("garbage.json");
        tokio::fs::write(&garbage, "{ nope").await.unwrap();
        assert!(EmbeddingIndex::load(&garbage).await.is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.index.json");
        let index = EmbeddingIndex::new("m", vec![chunk("a", vec![0.25, 0.75])]);

        index.save(&path).await.unwrap();
        let loaded = EmbeddingIndex::load(&path).await.unwrap();
        assert_eq!(loaded, index);
    }
}
