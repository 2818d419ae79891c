//! LLM provider adapters

pub mod openai_compat;
pub mod stub;

pub use openai_compat::OpenAiCompatSummarizer;
pub use stub::StubSummarizer;

use feedbrief_domain::{SUMMARY_DELIMITER, SummaryRequest};

/// Common LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Proxy URL for all summarizer traffic
    pub proxy: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            timeout_secs: 60,
            proxy: None,
        }
    }
}

/// Build the system instruction for a summary request
pub fn build_summary_instruction(request: &SummaryRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a news digest assistant. Reply in the language '{}'.\n\n",
        request.language
    ));
    prompt.push_str(&format!(
        "1. Extract {} keywords from the article the user sends and list them on one line, separated by commas.\n",
        request.keyword_count
    ));
    prompt.push_str(&format!(
        "2. Then write the marker '{}' followed by a point-form summary of at most {} words.\n\n",
        SUMMARY_DELIMITER, request.max_words
    ));
    prompt.push_str("Output only the keywords, the marker and the summary. Do not add any other text.\n");

    prompt
}
