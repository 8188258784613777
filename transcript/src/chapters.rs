//! Chapter segmentation.
//!
//! Replays transcript events and cuts them into chapters at explicit
//! breaks and every `steps_per_chapter` commands. Empty spans are dropped,
//! so chapter numbers stay contiguous.

use crate::event::{EventKind, TranscriptEvent};

/// Steps per chapter when nothing else is configured.
pub const DEFAULT_STEPS_PER_CHAPTER: usize = 50;

/// Content of the chapter emitted for a transcript with nothing to show.
pub const EMPTY_CHAPTER_CONTENT: &str = "(Empty)";

/// A contiguous span of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// 1-based position in the export.
    pub index: usize,
    pub content: String,

    /// Set only on the stand-in for an empty transcript.
    placeholder: bool,
}

impl Chapter {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
            placeholder: false,
        }
    }

    /// The single chapter standing in for an empty transcript.
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Self::new(1, EMPTY_CHAPTER_CONTENT)
        }
    }

    /// Whether this chapter stands in for an empty transcript. A real
    /// chapter whose text happens to read `(Empty)` is not a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Render as a markdown section.
    pub fn render(&self) -> String {
        format!("# Chapter {}\n\n{}", self.index, self.content)
    }
}

#[derive(Default)]
struct Segmenter {
    chapters: Vec<Chapter>,
    buffer: Vec<String>,
    steps: usize,
}

impl Segmenter {
    fn flush(&mut self) {
        let content = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();
        if !content.is_empty() {
            let index = self.chapters.len() + 1;
            self.chapters.push(Chapter::new(index, content));
        }
    }

    fn push(&mut self, line: String) {
        self.buffer.push(line);
    }
}

/// Split `events` into chapters. A `steps_per_chapter` of 0 disables
/// step-based cuts.
pub fn segment(events: &[TranscriptEvent], steps_per_chapter: usize) -> Vec<Chapter> {
    let mut state = Segmenter::default();

    for event in events {
        match event.kind {
            EventKind::Command => {
                state.steps += 1;
                state.push(format!("\n> {}", event.text.as_deref().unwrap_or_default()));
                if steps_per_chapter > 0 && state.steps % steps_per_chapter == 0 {
                    state.flush();
                }
            }
            EventKind::Narration => {
                if let Some(text) = event.text() {
                    state.push(format!("\n{text}"));
                }
                if !event.choices().is_empty() {
                    state.push(format!("\nChoices: {}", event.choices().join(" | ")));
                }
            }
            EventKind::Output => {
                if let Some(text) = event.text() {
                    state.push(format!("\n{text}"));
                }
            }
            EventKind::Note => {
                if let Some(text) = event.text() {
                    state.push(format!("\n[Author Note] {text}"));
                }
            }
            EventKind::ChapterBreak => {
                state.flush();
                state.steps = 0;
            }
            EventKind::Error | EventKind::Bookmark => {}
        }
    }

    state.flush();
    if state.chapters.is_empty() {
        state.chapters.push(Chapter::placeholder());
    }
    state.chapters
}
