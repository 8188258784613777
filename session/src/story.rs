//! The human-readable story log (`story.md`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only markdown log of what the player saw.
#[derive(Debug, Clone)]
pub struct StoryLog {
    path: PathBuf,
}

impl StoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(text.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

/// Story log entry for a command.
pub fn command_entry(command: &str) -> String {
    format!("\n\n> {command}\n")
}

/// Story log entry for narration, with numbered choices.
pub fn narration_entry(narration: &str, choices: &[String]) -> String {
    let mut out = format!("\n{narration}");
    if !choices.is_empty() {
        let numbered: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, choice)| format!("{}) {choice}", i + 1))
            .collect();
        out.push_str(&format!("\nChoices: {}", numbered.join(" | ")));
    }
    out.push('\n');
    out
}
