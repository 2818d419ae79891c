//! Summarization use case

use async_trait::async_trait;

use crate::{
    clean::truncate_chars,
    model::SummaryRequest,
    ports::{SummarizeError, Summarizer},
};

/// Marker prefixed to bodies whose summarization failed
pub const FALLBACK_MARKER: &str = "[summary unavailable]";

/// Configuration for the summarize use case
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Summary language
    pub language: String,
    /// Keywords to extract ahead of the summary
    pub keyword_count: usize,
    /// Word budget of the summary
    pub max_words: usize,
    /// Length of the excerpt kept when summarization fails
    pub excerpt_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            keyword_count: 5,
            max_words: 200,
            excerpt_chars: 500,
        }
    }
}

/// Use case for summarizing cleaned text
pub struct SummarizeUseCase<S> {
    summarizer: S,
    config: SummaryConfig,
}

impl<S: Summarizer> SummarizeUseCase<S> {
    pub fn new(summarizer: S, config: SummaryConfig) -> Self {
        Self { summarizer, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.summarizer.is_enabled()
    }

    /// Summarize plain text; a blank result counts as a failure
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let request = SummaryRequest {
            text: text.to_string(),
            language: self.config.language.clone(),
            keyword_count: self.config.keyword_count,
            max_words: self.config.max_words,
        };

        tracing::debug!(
            text_length = text.len(),
            max_tokens = request.max_output_tokens(),
            "Requesting summary"
        );

        let summary = self.summarizer.summarize(&request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummarizeError::InvalidFormat("Empty summary".to_string()));
        }

        Ok(summary.to_string())
    }

    /// Visible, bounded stand-in for a summary that could not be produced
    pub fn fallback_excerpt(&self, text: &str) -> String {
        let (excerpt, truncated) = truncate_chars(text, self.config.excerpt_chars);
        let ellipsis = if truncated { "…" } else { "" };
        format!("{FALLBACK_MARKER} {}{ellipsis}", excerpt.trim_end())
    }
}

#[async_trait]
impl<S: Summarizer + ?Sized> Summarizer for &S {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        (*self).summarize(request).await
    }

    fn is_enabled(&self) -> bool {
        (*self).is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSummarizer {
        response: Result<String, ()>,
        requests: Mutex<Vec<SummaryRequest>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response
                .clone()
                .map_err(|_| SummarizeError::Api("boom".to_string()))
        }
    }

    fn summarizer(response: Result<&str, ()>) -> RecordingSummarizer {
        RecordingSummarizer {
            response: response.map(String::from),
            requests: Mutex::new(vec![]),
        }
    }

    #[tokio::test]
    async fn passes_configured_budget_to_summarizer() {
        let fake = summarizer(Ok("kw <br><br>Summary: text"));
        let usecase = SummarizeUseCase::new(
            &fake,
            SummaryConfig {
                language: "zh".to_string(),
                keyword_count: 3,
                max_words: 120,
                ..Default::default()
            },
        );

        let summary = usecase.summarize("some article").await.unwrap();
        assert_eq!(summary, "kw <br><br>Summary: text");

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].language, "zh");
        assert_eq!(requests[0].keyword_count, 3);
        assert_eq!(requests[0].max_words, 120);
        assert_eq!(requests[0].text, "some article");
    }

    #[tokio::test]
    async fn blank_summary_is_a_failure() {
        let fake = summarizer(Ok("   "));
        let usecase = SummarizeUseCase::new(&fake, SummaryConfig::default());
        assert!(matches!(
            usecase.summarize("text").await,
            Err(SummarizeError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn summarizer_errors_propagate() {
        let fake = summarizer(Err(()));
        let usecase = SummarizeUseCase::new(&fake, SummaryConfig::default());
        assert!(matches!(
            usecase.summarize("text").await,
            Err(SummarizeError::Api(_))
        ));
    }

    #[test]
    fn fallback_excerpt_is_marked_and_bounded() {
        let fake = summarizer(Err(()));
        let usecase = SummarizeUseCase::new(
            &fake,
            SummaryConfig {
                excerpt_chars: 10,
                ..Default::default()
            },
        );

        let excerpt = usecase.fallback_excerpt(&"a".repeat(50));
        assert_eq!(excerpt, format!("{FALLBACK_MARKER} aaaaaaaaaa…"));

        let short = usecase.fallback_excerpt("short");
        assert_eq!(short, format!("{FALLBACK_MARKER} short"));
    }
}
