use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ghostwriter_embeddings::{Embedding, EmbeddingProvider};
use ghostwriter_narration::{
    ChatBackend, ChatRequest, NarrationConfig, NarrationProvider, NarrationError,
};
use ghostwriter_session::{ChapterSummarizer, NarrativeSession, SessionConfig, SummaryConfig};
use ghostwriter_transcript::{EventKind, TranscriptConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Returns canned text and remembers every request.
struct RecordingBackend {
    reply: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingBackend {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &ChatRequest) -> ghostwriter_narration::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reply == "!" {
            return Err(NarrationError::ApiRequest("offline".to_string()));
        }
        Ok(self.reply.clone())
    }
}

/// Embeds "bell" texts along one axis and everything else along the other.
struct BellEmbedder;

#[async_trait]
impl EmbeddingProvider for BellEmbedder {
    fn name(&self) -> &str {
        "bell"
    }

    fn model(&self) -> &str {
        "bell-v1"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn embed(&self, texts: &[String]) -> ghostwriter_embeddings::Result<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("bell") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

struct Fixture {
    _dir: TempDir,
    config: SessionConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    std::fs::create_dir(root.join("canon")).unwrap();
    std::fs::write(
        root.join("canon/bell.md"),
        "The drowned bell rings beneath Hollowmere at dusk.",
    )
    .unwrap();
    std::fs::write(root.join("canon/market.txt"), "Fishmongers shout over the pier.").unwrap();
    std::fs::write(
        root.join("seed.json"),
        r#"{
            "world": {"title": "Hollowmere", "tone": "melancholy"},
            "characters": [{"name": "Ada", "traits": ["wary"]}, {"name": "Bram"}]
        }"#,
    )
    .unwrap();

    let config = SessionConfig::new(root.join("session"))
        .with_player_name("Wren")
        .with_seed_path(root.join("seed.json"))
        .with_canon_path(root.join("canon"));

    Fixture { _dir: dir, config }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn local_turns_are_recorded_and_exported() {
    init_tracing();
    let fx = fixture();
    let config = fx.config.clone().with_transcript(TranscriptConfig {
        auto_chapter_every: 2,
        steps_per_chapter: 0,
        ..TranscriptConfig::default()
    });
    let mut session = NarrativeSession::open(config).await.unwrap();
    assert!(session.seed_warnings().is_empty());
    assert_eq!(session.seed().title(), Some("Hollowmere"));

    let opening = session.narrate(Some("the pier"), None).await.unwrap();
    assert_eq!(
        opening.narration,
        "Wren stands in the pier. In the melancholy world of Hollowmere, the air is thick with possibility. Nearby figures linger: Ada, Bram."
    );
    assert!(!session.complete_step().await.unwrap());

    let command = session.submit_command("2").await.unwrap();
    assert_eq!(command, "inventory");
    let reply = session.narrate(Some("the pier"), Some(&command)).await.unwrap();
    assert!(reply.narration.starts_with("After the command \"inventory\", Wren"));
    assert!(!reply.choices.contains(&"inventory".to_string()));
    assert!(session.complete_step().await.unwrap());

    session.add_note("Bram is lying.").await.unwrap();
    let label = session.add_bookmark(None).await.unwrap();
    assert_eq!(label, "mark-1");

    let kinds: Vec<EventKind> = session
        .transcript()
        .read_events()
        .await
        .unwrap()
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Narration,
            EventKind::Command,
            EventKind::Command,
            EventKind::Narration,
            EventKind::ChapterBreak,
            EventKind::Note,
            EventKind::Bookmark,
        ]
    );

    let story = read(session.story().path());
    assert!(story.contains("\n\n> 2\n\n\n> inventory\n"));
    assert!(story.contains("Choices: 1) look | 2) inventory"));
    assert!(story.contains("# Chapter Break (auto)"));
    assert!(session.config().session_dir.join("bookmark-001-mark-1.txt").exists());

    let out = session.export_chapters().await.unwrap();
    let exported = read(&out);
    assert!(exported.starts_with("# Chapter 1\n\nWren stands in the pier."));
    assert!(exported.contains("# Chapter 2\n\n[Author Note] Bram is lying."));
    assert!(exported.contains("\n\n---\n\n# Raw Story Log\n\n"));
}

#[tokio::test]
async fn remote_narration_sees_canon_and_transcript() {
    init_tracing();
    let fx = fixture();
    let backend = RecordingBackend::new(r#"{"narration":"The bell answers.","choices":["listen","dive"]}"#);
    let narrator = NarrationProvider::remote(backend.clone(), &NarrationConfig::default());

    let mut session = NarrativeSession::open(fx.config.clone())
        .await
        .unwrap()
        .with_narrator(narrator);

    session.submit_command("ring the bell").await.unwrap();
    let narration = session
        .narrate(Some("belfry"), Some("ring the bell"))
        .await
        .unwrap();
    assert_eq!(narration.choices, vec!["listen", "dive"]);
    assert_eq!(session.last_choices(), ["listen".to_string(), "dive".to_string()]);

    let requests = backend.requests();
    let system = &requests[0].messages[0].content;
    let user = &requests[0].messages[1].content;
    assert!(system.contains(
        "Canon context (snippets):\n- The drowned bell rings beneath Hollowmere at dusk."
    ));
    assert!(system.contains("- Ada (wary)"));
    assert!(user.contains("Player command: ring the bell"));
    assert!(user.contains("Current location: belfry"));
    assert!(user.contains("Recent transcript:\n> ring the bell"));
}

#[tokio::test]
async fn static_canon_skips_retrieval() {
    let fx = fixture();
    let mut config = fx.config.clone();
    config.canon.dynamic = false;
    let backend = RecordingBackend::new("{}");
    let narrator = NarrationProvider::remote(backend.clone(), &NarrationConfig::default());

    let mut session = NarrativeSession::open(config).await.unwrap().with_narrator(narrator);
    assert_eq!(session.canon_query(Some("bell")), None);

    let narration = session.narrate(None, Some("bell")).await.unwrap();
    assert!(narration.is_empty());
    assert!(!backend.requests()[0].messages[0].content.contains("Canon context"));
}

#[tokio::test]
async fn canon_query_prefers_configured_then_command_then_title() {
    let fx = fixture();
    let session = NarrativeSession::open(fx.config.clone()).await.unwrap();
    assert_eq!(session.canon_query(Some("look")), Some("look"));
    assert_eq!(session.canon_query(None), Some("Hollowmere"));
    assert_eq!(session.canon_query(Some("  ")), Some("Hollowmere"));

    let mut config = fx.config.clone();
    config.canon.query = Some("bells".to_string());
    let session = NarrativeSession::open(config).await.unwrap();
    assert_eq!(session.canon_query(Some("look")), Some("bells"));
}

#[tokio::test]
async fn export_prepends_summaries() {
    let fx = fixture();
    let backend = RecordingBackend::new("A bell tolls.");
    let summarizer = ChapterSummarizer::new(backend.clone(), SummaryConfig::default());
    let mut session = NarrativeSession::open(fx.config.clone())
        .await
        .unwrap()
        .with_summarizer(summarizer);

    session.submit_command("look").await.unwrap();
    session.narrate(None, Some("look")).await.unwrap();
    session.chapter_break().await.unwrap();
    session.submit_command("north").await.unwrap();

    let exported = read(&session.export_chapters().await.unwrap());
    assert!(exported.starts_with(
        "## Chapter Summaries\n\n### Chapter 1\n\nA bell tolls.\n\n### Chapter 2\n\nA bell tolls.\n\n---\n\n# Chapter 1\n\n> look"
    ));
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn seed_reload_reports_warnings() {
    let fx = fixture();
    let mut session = NarrativeSession::open(fx.config.clone()).await.unwrap();

    let bad_seed = fx.config.session_dir.parent().unwrap().join("bad.json");
    std::fs::write(&bad_seed, r#"{"characters": [{"name": 42}]}"#).unwrap();

    let warnings = session.reload_seed(Some(&bad_seed)).to_vec();
    assert!(warnings.iter().any(|w| w.contains("characters[0].name")));
    assert_eq!(session.seed().characters[0].name, "42");
    assert_eq!(session.seed().title(), None);

    session.reload_seed(Some(Path::new("/definitely/not/here.json")));
    assert_eq!(session.seed().title(), Some("Seedless Realm"));
}

#[tokio::test]
async fn embedding_index_feeds_lore_and_narration() {
    init_tracing();
    let fx = fixture();
    let backend = RecordingBackend::new("{}");
    let narrator = NarrationProvider::remote(backend.clone(), &NarrationConfig::default());
    let mut session = NarrativeSession::open(fx.config.clone())
        .await
        .unwrap()
        .with_narrator(narrator)
        .with_embedder(Arc::new(BellEmbedder));

    let index = session.build_embedding_index().await.unwrap();
    assert_eq!(index.len(), 2);
    assert!(fx.config.embedding_index_path().exists());

    let lore = session.lore("bell").await.unwrap();
    assert!(lore.starts_with("Canon results for: bell\nThe drowned bell rings"));
    assert!(lore.contains("(bell.md@0) The drowned bell"));

    session.narrate(None, Some("bell")).await.unwrap();
    let system = &backend.requests()[0].messages[0].content;
    assert!(system.contains(
        "- The drowned bell rings beneath Hollowmere at dusk.\n- The drowned bell rings beneath Hollowmere at dusk."
    ));

    std::fs::write(fx.config.canon.path.join("tide.md"), "The tide hides the bell.").unwrap();
    assert_eq!(session.reload_canon().await.unwrap(), 3);
}

#[tokio::test]
async fn research_without_key_is_empty() {
    let fx = fixture();
    let session = NarrativeSession::open(fx.config.clone()).await.unwrap();
    assert!(session.research_links("bells").await.unwrap().is_empty());
}

#[tokio::test]
async fn custom_index_path_inside_canon_is_not_lore() {
    let fx = fixture();
    let mut config = fx.config.clone();
    config.embeddings.index_path = Some(config.canon.path.join("vectors.json"));

    let session = NarrativeSession::open(config)
        .await
        .unwrap()
        .with_embedder(Arc::new(BellEmbedder));
    session.build_embedding_index().await.unwrap();

    assert_eq!(session.reload_canon().await.unwrap(), 2);
    let snippets = session.retriever().retrieve("bell").await;
    assert!(snippets.iter().all(|s| !s.contains("\"vector\"")));
    assert_eq!(
        snippets[0],
        "The drowned bell rings beneath Hollowmere at dusk."
    );
}
