//! Offline construction of an [`EmbeddingIndex`] from a canon directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{EmbeddingError, Result};
use crate::index::{EmbeddingChunk, EmbeddingIndex};
use crate::provider::EmbeddingProvider;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1200;

/// File extensions that are chunked.
const INDEXED_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Chunking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk size in characters.
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// A slice of a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Character offset in the source.
    pub offset: usize,
    pub text: String,
}

/// Split `text` into consecutive, non-overlapping chunks of `chunk_size`
/// characters. The last chunk may be shorter.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<TextChunk> {
    let size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .enumerate()
        .map(|(i, window)| TextChunk {
            offset: i * size,
            text: window.iter().collect(),
        })
        .collect()
}

/// Builds embedding indexes by walking a directory of text files.
pub struct IndexBuilder<'a> {
    provider: &'a dyn EmbeddingProvider,
    config: ChunkingConfig,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            provider,
            config: ChunkingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChunkingConfig) -> Self {
        self.config = config;
        self
    }

    /// Chunk and embed every indexable file under `root`.
    pub async fn build(&self, root: &Path) -> Result<EmbeddingIndex> {
        if !self.provider.is_available() {
            return Err(EmbeddingError::ProviderNotConfigured);
        }

        let mut chunks = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let indexed = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| INDEXED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if !indexed {
                continue;
            }

            let text = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    continue;
                }
            };

            let file_name = entry.file_name().to_string_lossy().to_string();
            let source = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            let pieces = chunk_text(&text, self.config.chunk_size);
            if pieces.is_empty() {
                continue;
            }
            let texts: Vec<String> = pieces.iter().map(|p| p.text.clone()).collect();
            let vectors = self.provider.embed(&texts).await?;
            debug!("Embedded {} chunks from {source}", vectors.len());

            chunks.extend(pieces.into_iter().zip(vectors).map(|(piece, vector)| {
                EmbeddingChunk {
                    id: format!("{file_name}:{}", piece.offset),
                    source: source.clone(),
                    offset: piece.offset,
                    length: piece.text.chars().count(),
                    text: piece.text,
                    vector,
                }
            }));
        }

        info!("Built embedding index with {} chunks", chunks.len());
        Ok(EmbeddingIndex::new(self.provider.model(), chunks))
    }

    /// Build the index for `root` and write it to `out`.
    pub async fn build_and_save(&self, root: &Path, out: &Path) -> Result<EmbeddingIndex> {
        let index = self.build(root).await?;
        index.save(out).await?;
        Ok(index)
    }
}
