//! Stub summarizer for testing and offline mode

use async_trait::async_trait;
use feedbrief_domain::{SUMMARY_DELIMITER, SummarizeError, Summarizer, SummaryRequest};

/// Stub summarizer that returns configurable responses
pub struct StubSummarizer {
    response: Option<String>,
    error: Option<SummarizeError>,
    enabled: bool,
}

impl StubSummarizer {
    /// Create a stub that returns a specific response
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            error: None,
            enabled: true,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: SummarizeError) -> Self {
        Self {
            response: None,
            error: Some(error),
            enabled: true,
        }
    }

    /// Create a stub that summarizes by taking the leading words of the text
    pub fn echo() -> Self {
        Self {
            response: None,
            error: None,
            enabled: true,
        }
    }

    /// Create a stub that reports summarization as switched off
    pub fn disabled() -> Self {
        Self {
            response: None,
            error: None,
            enabled: false,
        }
    }
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                SummarizeError::Api(msg) => SummarizeError::Api(msg.clone()),
                SummarizeError::InvalidFormat(msg) => SummarizeError::InvalidFormat(msg.clone()),
                SummarizeError::RateLimited => SummarizeError::RateLimited,
                SummarizeError::Timeout => SummarizeError::Timeout,
                SummarizeError::Config(msg) => SummarizeError::Config(msg.clone()),
            });
        }

        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        // Echo mode: leading words stand in for keywords and summary
        let words: Vec<&str> = request.text.split_whitespace().collect();
        let keywords = words
            .iter()
            .take(request.keyword_count)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let summary = words
            .iter()
            .take(request.max_words)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Ok(format!("{keywords} {SUMMARY_DELIMITER} - {summary}"))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SummaryRequest {
        SummaryRequest {
            text: "one two three four five six".to_string(),
            language: "en".to_string(),
            keyword_count: 2,
            max_words: 4,
        }
    }

    #[tokio::test]
    async fn test_configured_response() {
        let summarizer = StubSummarizer::with_response("fixed");
        let result = summarizer.summarize(&sample_request()).await.unwrap();

        assert_eq!(result, "fixed");
    }

    #[tokio::test]
    async fn test_error_stub() {
        let summarizer = StubSummarizer::with_error(SummarizeError::Timeout);
        let result = summarizer.summarize(&sample_request()).await;

        assert!(matches!(result, Err(SummarizeError::Timeout)));
    }

    #[tokio::test]
    async fn test_echo_stub() {
        let summarizer = StubSummarizer::echo();
        let result = summarizer.summarize(&sample_request()).await.unwrap();

        assert_eq!(result, "one, two <br><br>Summary: - one two three four");
    }

    #[test]
    fn test_disabled_stub() {
        assert!(!StubSummarizer::disabled().is_enabled());
        assert!(StubSummarizer::echo().is_enabled());
    }
}
