//! HTTP feed fetcher

use async_trait::async_trait;
use feedbrief_domain::{FeedFetcher, FetchError};
use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use std::collections::HashMap;
use std::time::Duration;

/// Browser user agents rotated across requests
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Fetches feed payloads over HTTP(S) with a bounded timeout
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching feed");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        tracing::debug!(url = %url, bytes = body.len(), "Fetched feed");

        Ok(body.to_vec())
    }
}

/// Stub fetcher serving canned payloads, for testing and offline mode
#[derive(Default)]
pub struct StubFeedFetcher {
    feeds: HashMap<String, Result<Vec<u8>, u16>>,
}

impl StubFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` for `url`
    pub fn with_feed(mut self, url: &str, payload: impl Into<Vec<u8>>) -> Self {
        self.feeds.insert(url.to_string(), Ok(payload.into()));
        self
    }

    /// Answer `url` with an HTTP error status
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.feeds.insert(url.to_string(), Err(status));
        self
    }
}

#[async_trait]
impl FeedFetcher for StubFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.feeds.get(url) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Transport(format!("No stub feed for {}", url))),
        }
    }
}
