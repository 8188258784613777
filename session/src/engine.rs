//! The per-turn narrative pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::fs;
use tracing::{debug, info, warn};

use ghostwriter_canon::{CanonIndex, SeedData, load_seed};
use ghostwriter_embeddings::{EmbeddingIndex, EmbeddingProvider, IndexBuilder, OpenAIProvider};
use ghostwriter_narration::{
    ChatBackend, Narration, NarrationInput, NarrationProvider, Narrator, OpenAIChatBackend,
    PlayerTurn,
};
use ghostwriter_retrieval::{Retriever, TavilySearch, WebSearchProvider, WebSearchResult};
use ghostwriter_transcript::{ChapterExporter, TranscriptEvent, TranscriptLog};

use crate::config::SessionConfig;
use crate::story::{StoryLog, command_entry, narration_entry};
use crate::summarize::ChapterSummarizer;

/// Text of a manual chapter break.
const CHAPTER_BREAK_TEXT: &str = "---";

/// Text of an automatic chapter break.
const AUTO_CHAPTER_BREAK_TEXT: &str = "--- (auto)";

/// Characters of a vector hit shown in lore listings.
const LORE_PREVIEW_CHARS: usize = 200;

/// Results per source in lore listings.
const LORE_TOP_K: usize = 2;

/// One running session: seed, indexes, narrator and the session files.
///
/// The session is the single writer of its transcript and story log.
pub struct NarrativeSession {
    /// Configuration.
    config: SessionConfig,

    /// Current seed.
    seed: SeedData,

    /// Warnings from the last seed load.
    seed_warnings: Vec<String>,

    /// Canon indexes.
    retriever: Retriever,

    /// Embedding backend for queries and index builds.
    embedder: Option<Arc<dyn EmbeddingProvider>>,

    /// Narration provider.
    narrator: NarrationProvider,

    /// Chapter summarizer, when summaries are enabled.
    summarizer: Option<ChapterSummarizer>,

    /// Web search collaborator.
    web: Arc<dyn WebSearchProvider>,

    transcript: TranscriptLog,
    story: StoryLog,
    steps: usize,
    bookmarks: usize,
    last_choices: Vec<String>,
}

impl NarrativeSession {
    /// Open a session, creating its directory and loading seed and canon.
    ///
    /// Seed and index problems are logged and degrade to defaults; only
    /// failing to create the session directory is an error.
    pub async fn open(config: SessionConfig) -> Result<Self> {
        info!("Opening session in {}", config.session_dir.display());

        fs::create_dir_all(&config.session_dir)
            .await
            .with_context(|| format!("failed to create {}", config.session_dir.display()))?;

        let loaded = load_seed(config.seed.path.as_deref(), &config.seed.defaults);
        log_seed_warnings(&loaded.warnings);

        let canon_path = config.canon.path.clone();
        let index_path = config.embedding_index_path();
        let excluded = vec![index_path.clone()];
        let canon = tokio::task::spawn_blocking(move || {
            CanonIndex::load_excluding(canon_path, &excluded)
        })
        .await?;
        let vectors = EmbeddingIndex::load(&index_path).await;

        let embedder: Option<Arc<dyn EmbeddingProvider>> =
            if config.embeddings.backend.api_key.is_some() {
                Some(Arc::new(OpenAIProvider::from_config(&config.embeddings.backend)))
            } else {
                None
            };

        let mut retriever = Retriever::new(canon, config.retrieval.clone())
            .with_embeddings(vectors)
            .with_canon_exclusions(vec![index_path]);
        if let Some(embedder) = &embedder {
            retriever = retriever.with_embedder(embedder.clone());
        }

        let summarizer = config.summaries.enabled.then(|| {
            let backend: Arc<dyn ChatBackend> =
                Arc::new(OpenAIChatBackend::new(&config.narration.chat_config()));
            ChapterSummarizer::new(backend, config.summaries.clone())
        });

        Ok(Self {
            narrator: NarrationProvider::from_config(&config.narration),
            web: Arc::new(TavilySearch::new(config.research.tavily_api_key.clone())),
            transcript: TranscriptLog::new(config.transcript_path()),
            story: StoryLog::new(config.story_path()),
            seed: loaded.seed,
            seed_warnings: loaded.warnings,
            retriever,
            embedder,
            summarizer,
            config,
            steps: 0,
            bookmarks: 0,
            last_choices: Vec::new(),
        })
    }

    /// Use `narrator` instead of the configured one.
    pub fn with_narrator(mut self, narrator: NarrationProvider) -> Self {
        self.narrator = narrator;
        self
    }

    /// Use `embedder` for queries and index builds.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.retriever = self.retriever.with_embedder(embedder.clone());
        self.embedder = Some(embedder);
        self
    }

    /// Summarize chapters on export with `summarizer`.
    pub fn with_summarizer(mut self, summarizer: ChapterSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Use `web` for research links.
    pub fn with_web_search(mut self, web: Arc<dyn WebSearchProvider>) -> Self {
        self.web = web;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn seed(&self) -> &SeedData {
        &self.seed
    }

    pub fn seed_warnings(&self) -> &[String] {
        &self.seed_warnings
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn story(&self) -> &StoryLog {
        &self.story
    }

    /// Completed steps so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Choices offered by the last narration.
    pub fn last_choices(&self) -> &[String] {
        &self.last_choices
    }

    /// Record a player command.
    ///
    /// A bare number picks from the last offered choices; the picked choice
    /// is recorded as a command too and returned in place of the input.
    pub async fn submit_command(&self, input: &str) -> Result<String> {
        self.record_command(input).await?;

        match self.resolve_choice(input).map(str::to_string) {
            Some(choice) => {
                debug!("Mapped {input} to choice {choice}");
                self.record_command(&choice).await?;
                Ok(choice)
            }
            None => Ok(input.to_string()),
        }
    }

    /// The choice a 1-based numeric input refers to.
    pub fn resolve_choice(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if input.starts_with('0') || !input.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let position: usize = input.parse().ok()?;
        self.last_choices
            .get(position.checked_sub(1)?)
            .map(String::as_str)
    }

    async fn record_command(&self, command: &str) -> Result<()> {
        self.transcript
            .append(&TranscriptEvent::command(command))
            .await?;
        self.story.append(&command_entry(command)).await
    }

    pub async fn record_output(&self, text: &str) -> Result<()> {
        Ok(self.transcript.append(&TranscriptEvent::output(text)).await?)
    }

    pub async fn record_error(&self, text: &str) -> Result<()> {
        Ok(self.transcript.append(&TranscriptEvent::error(text)).await?)
    }

    /// Add an author note. Notes show up in exports but not in prompts.
    pub async fn add_note(&self, text: &str) -> Result<()> {
        Ok(self.transcript.append(&TranscriptEvent::note(text)).await?)
    }

    /// Add a bookmark and a marker file in the session directory. Returns
    /// the label used.
    pub async fn add_bookmark(&mut self, label: Option<&str>) -> Result<String> {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mark-{}", self.bookmarks + 1));
        self.bookmarks += 1;

        self.transcript
            .append(&TranscriptEvent::bookmark(&label))
            .await?;
        self.story
            .append(&format!("\n\n[Bookmark] {label}\n"))
            .await?;

        let marker = self.config.session_dir.join(format!(
            "bookmark-{:03}-{}.txt",
            self.bookmarks,
            bookmark_slug(&label)
        ));
        if let Err(e) = fs::write(&marker, &label).await {
            warn!("Failed to write bookmark marker {}: {e}", marker.display());
        }

        Ok(label)
    }

    /// Start a new chapter.
    pub async fn chapter_break(&self) -> Result<()> {
        self.transcript
            .append(&TranscriptEvent::chapter_break(CHAPTER_BREAK_TEXT))
            .await?;
        self.story.append("\n\n# Chapter Break\n\n").await
    }

    /// Count a completed step. Every `auto_chapter_every` steps an
    /// automatic chapter break is recorded; returns whether one was.
    pub async fn complete_step(&mut self) -> Result<bool> {
        self.steps += 1;

        let every = self.config.transcript.auto_chapter_every;
        if every == 0 || self.steps % every != 0 {
            return Ok(false);
        }

        debug!("Automatic chapter break after step {}", self.steps);
        self.transcript
            .append(&TranscriptEvent::chapter_break(AUTO_CHAPTER_BREAK_TEXT))
            .await?;
        self.story.append("\n\n# Chapter Break (auto)\n\n").await?;
        Ok(true)
    }

    /// The query canon retrieval runs for a turn, if any.
    pub fn canon_query<'a>(&'a self, last_command: Option<&'a str>) -> Option<&'a str> {
        if !self.config.canon.dynamic {
            return None;
        }
        [
            self.config.canon.query.as_deref(),
            last_command,
            self.seed.title(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|q| !q.is_empty())
    }

    /// Narrate the current turn and record the result.
    ///
    /// Narration itself never fails; errors only come from writing the
    /// session files.
    pub async fn narrate(
        &mut self,
        room_id: Option<&str>,
        last_command: Option<&str>,
    ) -> Result<Narration> {
        let snippets = match self.canon_query(last_command) {
            Some(query) => self.retriever.retrieve(query).await,
            None => Vec::new(),
        };

        let tail = self
            .transcript
            .tail(
                self.config.transcript.tail_lines,
                self.config.transcript.tail_chars,
            )
            .await?;

        let mut turn = PlayerTurn::new(&self.config.player_name).with_transcript_tail(tail);
        if let Some(room) = room_id {
            turn = turn.with_room(room);
        }
        if let Some(command) = last_command {
            turn = turn.with_last_command(command);
        }

        let input = NarrationInput::new(&self.seed, &turn).with_snippets(&snippets);
        let narration = self.narrator.generate(&input).await;
        if narration.is_empty() {
            warn!("Narrator {} produced no narration", self.narrator.name());
        }

        self.transcript
            .append(&TranscriptEvent::narration(
                &narration.narration,
                narration.choices.clone(),
            ))
            .await?;
        self.story
            .append(&narration_entry(&narration.narration, &narration.choices))
            .await?;

        self.last_choices = narration.choices.clone();
        Ok(narration)
    }

    /// Search canon and the vector index for `query`, record the listing as
    /// output and return it.
    pub async fn lore(&self, query: &str) -> Result<String> {
        let query = query.trim();
        let results = self.retriever.lore(query, LORE_TOP_K).await;

        let mut lines = vec![format!("Canon results for: {query}")];
        lines.extend(results.canon);
        lines.extend(results.vectors.iter().map(|hit| {
            let preview: String = hit.chunk.text.chars().take(LORE_PREVIEW_CHARS).collect();
            format!("({}@{}) {preview}...", hit.chunk.source, hit.chunk.offset)
        }));

        let listing = lines.join("\n");
        self.record_output(&listing).await?;
        Ok(listing)
    }

    /// Reload the canon corpus and the embedding index. Returns the number
    /// of canon documents.
    pub async fn reload_canon(&self) -> Result<usize> {
        let count = self.retriever.reload_canon(&self.config.canon.path).await?;
        self.retriever
            .reload_embeddings(self.config.embedding_index_path())
            .await;
        self.record_output(&format!("(canon reloaded: {count} docs)"))
            .await?;
        Ok(count)
    }

    /// Reload the seed, switching to `path` when given. Returns the
    /// validation warnings.
    pub fn reload_seed(&mut self, path: Option<&Path>) -> &[String] {
        if let Some(path) = path {
            self.config.seed.path = Some(path.to_path_buf());
        }

        let loaded = load_seed(self.config.seed.path.as_deref(), &self.config.seed.defaults);
        log_seed_warnings(&loaded.warnings);
        info!("Seed reloaded");

        self.seed = loaded.seed;
        self.seed_warnings = loaded.warnings;
        &self.seed_warnings
    }

    /// Reload only the embedding index. Returns whether one was loaded.
    pub async fn reload_embeddings(&self) -> bool {
        self.retriever
            .reload_embeddings(self.config.embedding_index_path())
            .await
    }

    /// Chunk and embed the canon directory, save the index and start using
    /// it.
    pub async fn build_embedding_index(&self) -> Result<EmbeddingIndex> {
        let Some(embedder) = &self.embedder else {
            bail!("no embedding backend configured");
        };

        let out = self.config.embedding_index_path();
        let index = IndexBuilder::new(embedder.as_ref())
            .with_config(self.config.embeddings.chunking.clone())
            .build_and_save(&self.config.canon.path, &out)
            .await
            .with_context(|| format!("failed to build embedding index {}", out.display()))?;

        self.retriever.replace_embeddings(Some(index.clone())).await;
        Ok(index)
    }

    /// Web search for research material.
    pub async fn research_links(&self, query: &str) -> Result<Vec<WebSearchResult>> {
        let results = self
            .web
            .search(query, self.config.research.web_results)
            .await?;
        debug!("{} returned {} results", self.web.name(), results.len());
        Ok(results)
    }

    /// Export chapters to `chapters.md`, prepending summaries when a
    /// summarizer is configured. Returns the written path.
    pub async fn export_chapters(&self) -> Result<PathBuf> {
        let exporter = ChapterExporter::new(
            self.transcript.clone(),
            self.config.story_path(),
            self.config.chapters_path(),
        )
        .with_steps_per_chapter(self.config.transcript.steps_per_chapter);

        let export = exporter.prepare().await?;
        let preface = match &self.summarizer {
            Some(summarizer) => summarizer.summary_block(&export.chapters).await,
            None => None,
        };
        let out = exporter.write(&export, preface.as_deref()).await?;

        self.record_output(&format!("(exported to {})", out.display()))
            .await?;
        Ok(out)
    }
}

fn log_seed_warnings(warnings: &[String]) {
    if !warnings.is_empty() {
        warn!("Seed warnings: {}", warnings.join(" | "));
    }
}

/// Lowercase `label` and collapse everything outside `[a-z0-9_-]` into
/// single dashes.
fn bookmark_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut in_gap = false;
    for c in label.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug
}
