//! Chapter summaries for exports.

use std::sync::Arc;

use tracing::warn;

use ghostwriter_narration::{ChatBackend, ChatMessage, ChatRequest};
use ghostwriter_transcript::Chapter;

use crate::config::SummaryConfig;

const SUMMARY_INSTRUCTION: &str =
    "Summarize the following chapter into 2-4 sentences. Return plain markdown text without headings.";

/// Text used when a chapter could not be summarized.
pub const SUMMARY_UNAVAILABLE: &str = "(Summary unavailable)";

/// Summarizes chapters one at a time through a chat backend.
pub struct ChapterSummarizer {
    backend: Arc<dyn ChatBackend>,
    config: SummaryConfig,
}

impl ChapterSummarizer {
    pub fn new(backend: Arc<dyn ChatBackend>, config: SummaryConfig) -> Self {
        Self { backend, config }
    }

    /// Summarize one chapter body. Backend failures give
    /// [`SUMMARY_UNAVAILABLE`].
    pub async fn summarize(&self, body: &str) -> String {
        let clipped: String = body.trim().chars().take(self.config.max_chars).collect();
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(SUMMARY_INSTRUCTION),
                ChatMessage::user(clipped),
            ],
            temperature: self.config.temperature,
            json_output: false,
        };

        match self.backend.complete(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Chapter summary failed: {e}");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    /// Build the `## Chapter Summaries` block, or `None` when there is
    /// nothing to summarize.
    pub async fn summary_block(&self, chapters: &[Chapter]) -> Option<String> {
        if chapters.iter().all(Chapter::is_placeholder) {
            return None;
        }

        let mut blocks = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let summary = self.summarize(&chapter.content).await;
            blocks.push(format!("### Chapter {}\n\n{summary}", chapter.index));
        }
        Some(format!("## Chapter Summaries\n\n{}", blocks.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghostwriter_narration::{NarrationError, Result};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Echoes the length of the user message; fails on "fail".
    struct LengthBackend {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatBackend for LengthBackend {
        fn name(&self) -> &str {
            "length"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            let user = &request.messages[1].content;
            if user == "fail" {
                return Err(NarrationError::ApiRequest("nope".to_string()));
            }
            Ok(format!("  {} chars  ", user.chars().count()))
        }
    }

    fn chapter(index: usize, content: &str) -> Chapter {
        Chapter::new(index, content)
    }

    #[tokio::test]
    async fn test_summary_block() {
        let backend = Arc::new(LengthBackend {
            requests: Mutex::new(Vec::new()),
        });
        let config = SummaryConfig {
            max_chars: 5,
            ..SummaryConfig::default()
        };
        let summarizer = ChapterSummarizer::new(backend.clone(), config);

        let block = summarizer
            .summary_block(&[chapter(1, "a long chapter"), chapter(2, "fail")])
            .await
            .unwrap();
        assert_eq!(
            block,
            "## Chapter Summaries\n\n### Chapter 1\n\n5 chars\n\n### Chapter 2\n\n(Summary unavailable)"
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].content, SUMMARY_INSTRUCTION);
        assert_eq!(requests[0].temperature, 0.5);
        assert!(!requests[0].json_output);
    }

    #[tokio::test]
    async fn test_placeholder_only_is_skipped() {
        let backend = Arc::new(LengthBackend {
            requests: Mutex::new(Vec::new()),
        });
        let summarizer = ChapterSummarizer::new(backend, SummaryConfig::default());
        assert!(summarizer.summary_block(&[Chapter::placeholder()]).await.is_none());
    }

    #[tokio::test]
    async fn test_chapter_reading_empty_is_summarized() {
        let backend = Arc::new(LengthBackend {
            requests: Mutex::new(Vec::new()),
        });
        let summarizer = ChapterSummarizer::new(backend, SummaryConfig::default());

        let block = summarizer
            .summary_block(&[chapter(1, "(Empty)")])
            .await
            .unwrap();
        assert_eq!(block, "## Chapter Summaries

### Chapter 1

7 chars");
    }
}
