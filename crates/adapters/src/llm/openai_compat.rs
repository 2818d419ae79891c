//! OpenAI-compatible chat completions adapter (DeepSeek, OpenAI and friends)

use async_trait::async_trait;
use feedbrief_domain::{SummarizeError, Summarizer, SummaryRequest};
use reqwest::{Client, Proxy};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmConfig, build_summary_instruction};

/// Summarizer backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatSummarizer {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl OpenAiCompatSummarizer {
    pub fn new(
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, SummarizeError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = Proxy::all(proxy)
                .map_err(|e| SummarizeError::Config(format!("Invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| SummarizeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the endpoint accepts our credentials
    pub async fn ping(&self) -> Result<(), SummarizeError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn call_api(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: build_summary_instruction(request),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.text.clone(),
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(request.max_output_tokens()),
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status() == 429 {
            return Err(SummarizeError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(SummarizeError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

fn map_transport_error(e: reqwest::Error) -> SummarizeError {
    if e.is_timeout() {
        SummarizeError::Timeout
    } else {
        SummarizeError::Api(e.to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiCompatSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let started = std::time::Instant::now();
        let result = self.call_api(request).await;
        match &result {
            Ok(text) => tracing::debug!(
                model = %self.config.model,
                elapsed_ms = started.elapsed().as_millis() as u64,
                response_length = text.len(),
                "Summary received"
            ),
            Err(e) => {
                tracing::warn!(model = %self.config.model, error = %e, "Summary request failed")
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> SummaryRequest {
        SummaryRequest {
            text: "Rust 2024 edition ships with async closures.".to_string(),
            language: "en".to_string(),
            keyword_count: 5,
            max_words: 200,
        }
    }

    fn summarizer(base_url: String) -> OpenAiCompatSummarizer {
        OpenAiCompatSummarizer::new(
            SecretString::new("test-key".into()),
            base_url,
            LlmConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "max_tokens": 500,
                "temperature": 0.5,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "rust, async <br><br>Summary: - closures"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let result = summarizer(mock_server.uri())
            .summarize(&sample_request())
            .await
            .unwrap();

        assert_eq!(result, "rust, async <br><br>Summary: - closures");
    }

    #[tokio::test]
    async fn test_summarize_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = summarizer(mock_server.uri())
            .summarize(&sample_request())
            .await;

        assert!(matches!(result, Err(SummarizeError::RateLimited)));
    }

    #[tokio::test]
    async fn test_summarize_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = summarizer(mock_server.uri())
            .summarize(&sample_request())
            .await;

        match result {
            Err(SummarizeError::Api(msg)) => assert!(msg.contains("overloaded")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_summarize_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&mock_server)
            .await;

        let result = summarizer(mock_server.uri())
            .summarize(&sample_request())
            .await;

        assert!(matches!(result, Err(SummarizeError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_ping_lists_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&mock_server)
            .await;

        let base = format!("{}/", mock_server.uri());
        summarizer(base).ping().await.unwrap();
    }
}
