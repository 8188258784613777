//! # Transcript
//!
//! The durable session history and what is derived from it.
//!
//! - **TranscriptLog**: append-only NDJSON, one [`TranscriptEvent`] per line
//! - **segment**: replay events into numbered [`Chapter`]s
//! - **ChapterExporter**: write the chapters plus the raw story log
//!
//! ```text
//! append(event) ──► transcript.ndjson ──► read_events ──► segment ──► chapters.md
//!                                    └──► tail ──► prompt
//! ```

pub mod chapters;
pub mod error;
pub mod event;
pub mod export;
pub mod log;

pub use chapters::{Chapter, DEFAULT_STEPS_PER_CHAPTER, EMPTY_CHAPTER_CONTENT, segment};
pub use error::{Result, TranscriptError};
pub use event::{EventKind, TranscriptEvent};
pub use export::{ChapterExport, ChapterExporter, render_export};
pub use log::{PARSE_ERROR_TEXT, TranscriptConfig, TranscriptLog, parse_lines, render_tail};
