//! Transcript records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a transcript record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Command,
    Output,
    Error,
    Narration,
    ChapterBreak,
    Note,
    Bookmark,
}

/// One line of the session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// When the event was recorded.
    pub t: DateTime<Utc>,

    #[serde(rename = "type")]
    pub kind: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl TranscriptEvent {
    /// Create an event of `kind` stamped now.
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            t: Utc::now(),
            kind,
            text: Some(text.into()),
            choices: None,
        }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(EventKind::Command, text)
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(EventKind::Output, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EventKind::Error, text)
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self::new(EventKind::Note, text)
    }

    pub fn bookmark(label: impl Into<String>) -> Self {
        Self::new(EventKind::Bookmark, label)
    }

    pub fn chapter_break(text: impl Into<String>) -> Self {
        Self::new(EventKind::ChapterBreak, text)
    }

    pub fn narration(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            choices: Some(choices),
            ..Self::new(EventKind::Narration, text)
        }
    }

    /// Set the timestamp.
    pub fn at(mut self, t: DateTime<Utc>) -> Self {
        self.t = t;
        self
    }

    /// Text, treating an empty string as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Choices, empty when absent.
    pub fn choices(&self) -> &[String] {
        self.choices.as_deref().unwrap_or_default()
    }
}
