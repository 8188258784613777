//! The chapter export artifact.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::chapters::{Chapter, segment};
use crate::error::{Result, TranscriptError};
use crate::log::TranscriptLog;

/// Render chapters and, when given, the raw story log as one document.
pub fn render_export(chapters: &[Chapter], raw_log: Option<&str>) -> String {
    let mut out = chapters
        .iter()
        .map(Chapter::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    if out.is_empty() {
        out = Chapter::placeholder().render();
    }
    if let Some(story) = raw_log {
        out.push_str("\n\n---\n\n# Raw Story Log\n\n");
        out.push_str(story);
    }
    out
}

/// Chapters ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterExport {
    pub chapters: Vec<Chapter>,
    pub raw_log: Option<String>,
}

impl ChapterExport {
    pub fn render(&self) -> String {
        render_export(&self.chapters, self.raw_log.as_deref())
    }
}

/// Writes `chapters.md` for a session.
#[derive(Debug, Clone)]
pub struct ChapterExporter {
    transcript: TranscriptLog,
    story_path: PathBuf,
    out_path: PathBuf,
    steps_per_chapter: usize,
}

impl ChapterExporter {
    pub fn new(
        transcript: TranscriptLog,
        story_path: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transcript,
            story_path: story_path.into(),
            out_path: out_path.into(),
            steps_per_chapter: crate::chapters::DEFAULT_STEPS_PER_CHAPTER,
        }
    }

    pub fn with_steps_per_chapter(mut self, steps: usize) -> Self {
        self.steps_per_chapter = steps;
        self
    }

    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    /// Segment the transcript and load the raw story log.
    ///
    /// The raw log is only included when the transcript exists too.
    pub async fn prepare(&self) -> Result<ChapterExport> {
        let raw = self.transcript.read_raw().await?;
        let events = raw
            .as_deref()
            .map(crate::log::parse_lines)
            .unwrap_or_default();
        let chapters = segment(&events, self.steps_per_chapter);

        let raw_log = if raw.is_some() {
            read_optional(&self.story_path).await?
        } else {
            None
        };

        Ok(ChapterExport { chapters, raw_log })
    }

    /// Write `export`, optionally preceded by `preface`. Returns the path.
    pub async fn write(&self, export: &ChapterExport, preface: Option<&str>) -> Result<PathBuf> {
        let mut document = export.render();
        if let Some(preface) = preface {
            document = format!("{preface}\n\n---\n\n{document}");
        }

        fs::write(&self.out_path, document)
            .await
            .map_err(|e| TranscriptError::WriteFile(format!("{}: {e}", self.out_path.display())))?;

        info!(
            "Exported {} chapters to {}",
            export.chapters.len(),
            self.out_path.display()
        );
        Ok(self.out_path.clone())
    }

    /// Segment the transcript and write the artifact. Returns its path.
    pub async fn export(&self) -> Result<PathBuf> {
        let export = self.prepare().await?;
        self.write(&export, None).await
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TranscriptError::ReadFile(format!("{}: {e}", path.display()))),
    }
}
