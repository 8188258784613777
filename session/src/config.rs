//! Session configuration.
//!
//! Every key is optional; a missing TOML table falls back to the defaults of
//! the component it configures.
//!
//! ```toml
//! session_dir = "sessions/hollowmere"
//! player_name = "Wren"
//!
//! [seed]
//! path = "seeds/hollowmere.json"
//!
//! [canon]
//! path = "canon"
//! dynamic = true
//!
//! [narration]
//! provider = "lmstudio"
//! max_retries = 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ghostwriter_canon::SeedDefaults;
use ghostwriter_embeddings::{ChunkingConfig, EmbeddingConfig};
use ghostwriter_narration::NarrationConfig;
use ghostwriter_retrieval::RetrievalConfig;
use ghostwriter_transcript::TranscriptConfig;

/// Name of the embedding index file inside the canon directory.
pub const EMBEDDING_INDEX_FILE: &str = "embeddings.index.json";

const TRANSCRIPT_FILE: &str = "transcript.ndjson";
const STORY_FILE: &str = "story.md";
const CHAPTERS_FILE: &str = "chapters.md";

/// Configuration for a narrative session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the transcript, story log and exports.
    pub session_dir: PathBuf,

    pub player_name: String,
    pub seed: SeedConfig,
    pub canon: CanonConfig,
    pub embeddings: EmbeddingsConfig,
    pub retrieval: RetrievalConfig,
    pub narration: NarrationConfig,
    pub transcript: TranscriptConfig,
    pub summaries: SummaryConfig,
    pub research: ResearchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_dir: PathBuf::from("sessions/default"),
            player_name: "Player".to_string(),
            seed: SeedConfig::default(),
            canon: CanonConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            retrieval: RetrievalConfig::default(),
            narration: NarrationConfig::default(),
            transcript: TranscriptConfig::default(),
            summaries: SummaryConfig::default(),
            research: ResearchConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration writing into `session_dir`.
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid session configuration")
    }

    /// Read and parse a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize session configuration")
    }

    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    pub fn with_seed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed.path = Some(path.into());
        self
    }

    pub fn with_canon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.canon.path = path.into();
        self
    }

    pub fn with_narration(mut self, narration: NarrationConfig) -> Self {
        self.narration = narration;
        self
    }

    pub fn with_transcript(mut self, transcript: TranscriptConfig) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.session_dir.join(TRANSCRIPT_FILE)
    }

    pub fn story_path(&self) -> PathBuf {
        self.session_dir.join(STORY_FILE)
    }

    pub fn chapters_path(&self) -> PathBuf {
        self.session_dir.join(CHAPTERS_FILE)
    }

    /// Where the embedding index is read from and written to.
    pub fn embedding_index_path(&self) -> PathBuf {
        self.embeddings
            .index_path
            .clone()
            .unwrap_or_else(|| self.canon.path.join(EMBEDDING_INDEX_FILE))
    }
}

/// Where the seed comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// JSON seed file or composite seed directory. Unset means the
    /// placeholder seed.
    pub path: Option<PathBuf>,

    /// Title and tone for composite seeds.
    pub defaults: SeedDefaults,
}

/// Canon corpus settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    pub path: PathBuf,

    /// Retrieve canon for every narration.
    pub dynamic: bool,

    /// Fixed retrieval query overriding the per-turn one.
    pub query: Option<String>,
}

impl Default for CanonConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("canon"),
            dynamic: true,
            query: None,
        }
    }
}

/// Embedding backend and index settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Index file; defaults to the canon directory.
    pub index_path: Option<PathBuf>,

    /// Backend used for queries and index builds. Without an API key
    /// vector search is skipped.
    pub backend: EmbeddingConfig,

    pub chunking: ChunkingConfig,
}

/// Optional chapter summaries on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub enabled: bool,

    /// Characters of each chapter sent for summarizing.
    pub max_chars: usize,

    pub temperature: f32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_chars: 6000,
            temperature: 0.5,
        }
    }
}

/// Web search for research links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Tavily API key; without one web search returns nothing.
    pub tavily_api_key: Option<String>,

    pub web_results: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            web_results: 5,
        }
    }
}
