//! The append-only NDJSON transcript file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::chapters::DEFAULT_STEPS_PER_CHAPTER;
use crate::error::{Result, TranscriptError};
use crate::event::{EventKind, TranscriptEvent};

/// Text of the event standing in for an unparsable line.
pub const PARSE_ERROR_TEXT: &str = "parse-error";

/// Transcript and chapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Lines considered for the prompt tail.
    pub tail_lines: usize,

    /// Characters kept from the end of the rendered tail.
    pub tail_chars: usize,

    /// Commands per exported chapter; 0 disables step cuts.
    pub steps_per_chapter: usize,

    /// Append an automatic chapter break every N steps; 0 disables.
    pub auto_chapter_every: usize,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            tail_lines: 20,
            tail_chars: 2000,
            steps_per_chapter: DEFAULT_STEPS_PER_CHAPTER,
            auto_chapter_every: 0,
        }
    }
}

/// A transcript file with a single writer.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line, creating the file if needed.
    pub async fn append(&self, event: &TranscriptEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| TranscriptError::WriteFile(format!("{}: {e}", self.path.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| TranscriptError::WriteFile(format!("{}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| TranscriptError::WriteFile(format!("{}: {e}", self.path.display())))?;

        debug!("Appended {:?} event to transcript", event.kind);
        Ok(())
    }

    /// Raw file content, `None` when the file does not exist.
    pub async fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TranscriptError::ReadFile(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Whether the transcript file exists.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// All events in file order. A missing file has no events.
    pub async fn read_events(&self) -> Result<Vec<TranscriptEvent>> {
        Ok(self
            .read_raw()
            .await?
            .map(|content| parse_lines(&content))
            .unwrap_or_default())
    }

    /// The rendered tail of the transcript for prompting.
    pub async fn tail(&self, max_lines: usize, max_chars: usize) -> Result<String> {
        Ok(self
            .read_raw()
            .await?
            .map(|content| render_tail(&content, max_lines, max_chars))
            .unwrap_or_default())
    }
}

/// Parse NDJSON content. Each unparsable line becomes an `error` event with
/// [`PARSE_ERROR_TEXT`].
pub fn parse_lines(content: &str) -> Vec<TranscriptEvent> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).unwrap_or_else(|e| {
                warn!("Unparsable transcript line {}: {e}", i + 1);
                TranscriptEvent::error(PARSE_ERROR_TEXT)
            })
        })
        .collect()
}

/// Render the last `max_lines` lines as prompt text, keeping only the last
/// `max_chars` characters.
///
/// Commands render as `> text`; narration and output as their text. Other
/// kinds and unparsable lines are left out.
pub fn render_tail(content: &str, max_lines: usize, max_chars: usize) -> String {
    let lines: Vec<&str> = content
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);

    let rendered: Vec<String> = lines[start..]
        .iter()
        .filter_map(|line| serde_json::from_str::<TranscriptEvent>(line).ok())
        .filter_map(|event| match event.kind {
            EventKind::Command => Some(format!(
                "> {}",
                event.text.as_deref().unwrap_or_default()
            )),
            EventKind::Narration | EventKind::Output => event.text().map(str::to_string),
            _ => None,
        })
        .collect();

    clip_tail(&rendered.join("\n"), max_chars)
}

/// Keep the last `max_chars` characters of `text`.
fn clip_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let log = TranscriptLog::new(dir.path().join("transcript.ndjson"));
        assert!(log.read_events().await.unwrap().is_empty());
        assert!(!log.exists().await);

        log.append(&TranscriptEvent::command("look")).await.unwrap();
        log.append(&TranscriptEvent::narration("Dust.", vec!["sneeze".to_string()]))
            .await
            .unwrap();

        let events = log.read_events().await.unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Command, EventKind::Narration]);
        assert_eq!(events[1].choices(), ["sneeze".to_string()]);

        let raw = log.read_raw().await.unwrap().unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_bad_lines_become_error_events() {
        let content = concat!(
            r#"{"t":"2024-05-01T10:00:00Z","type":"command","text":"look"}"#,
            "\n{oops\n\n",
            r#"{"t":"2024-05-01T10:00:01Z","type":"unknown"}"#,
            "\n",
            r#"{"t":"2024-05-01T10:00:02Z","type":"output","text":"ok"}"#,
        );

        let events = parse_lines(content);
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].kind, EventKind::Error);
        assert_eq!(events[1].text(), Some(PARSE_ERROR_TEXT));
        assert_eq!(events[2].text(), Some(PARSE_ERROR_TEXT));
        assert_eq!(events[3].text(), Some("ok"));
    }

    fn line(kind: &str, text: &str) -> String {
        format!(r#"{{"t":"2024-05-01T10:00:00Z","type":"{kind}","text":"{text}"}}"#)
    }

    #[test]
    fn test_tail_renders_recent_lines() {
        let content = [
            line("command", "look"),
            line("narration", "A hall."),
            line("note", "hidden"),
            "garbage".to_string(),
            line("output", "Saved."),
            line("command", "north"),
        ]
        .join("\n");

        assert_eq!(
            render_tail(&content, 20, 2000),
            "> look\nA hall.\nSaved.\n> north"
        );
        assert_eq!(render_tail(&content, 2, 2000), "Saved.\n> north");
    }

    #[test]
    fn test_tail_clips_to_last_chars() {
        let content = [line("output", "abcdef"), line("command", "go")].join("\n");
        assert_eq!(render_tail(&content, 20, 6), "f\n> go");
        assert_eq!(render_tail("", 20, 6), "");
    }

    #[test]
    fn test_config_defaults() {
        let config: TranscriptConfig = serde_json::from_str(r#"{"tail_lines": 5}"#).unwrap();
        assert_eq!(config.tail_lines, 5);
        assert_eq!(config.tail_chars, 2000);
        assert_eq!(config.steps_per_chapter, 50);
        assert_eq!(config.auto_chapter_every, 0);
    }
}
