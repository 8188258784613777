//! # Session
//!
//! Runs the ghostwriter pipeline for one interactive session:
//!
//! ```text
//! command ──► transcript ──► Retriever ──► snippets ──► NarrationProvider
//!                 ▲                                          │
//!                 └──────── narration + choices ◄────────────┘
//!
//! export_chapters: transcript ──► segment ──► (summaries) ──► chapters.md
//! ```
//!
//! Configuration is an explicit [`SessionConfig`], usually read from TOML.

pub mod config;
pub mod engine;
pub mod story;
pub mod summarize;

pub use config::{
    CanonConfig, EMBEDDING_INDEX_FILE, EmbeddingsConfig, ResearchConfig, SeedConfig,
    SessionConfig, SummaryConfig,
};
pub use engine::NarrativeSession;
pub use story::StoryLog;
pub use summarize::{ChapterSummarizer, SUMMARY_UNAVAILABLE};
