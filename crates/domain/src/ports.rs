//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{Channel, Item, RawEntry, RunEvent, SummaryRequest};

/// Error type for feed fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,
    #[error("Source returned HTTP {0}")]
    Status(u16),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Port for retrieving raw feed payloads
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the raw bytes published at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Malformed feed payload
#[derive(Debug, Error)]
#[error("Feed parse error: {0}")]
pub struct ParseError(pub String);

/// Port for decoding feed payloads into entries
pub trait FeedParser: Send + Sync {
    /// Parse a payload into entries, in the order the feed lists them
    fn parse(&self, payload: &[u8]) -> Result<Vec<RawEntry>, ParseError>;
}

/// Error type for summarizer operations
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for the external language-completion capability
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a summary for the request, in a single attempt
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError>;

    /// Whether summaries should be requested at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Error type for channel store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the persisted, capped collection of each channel
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Load the collection, newest first, truncated to the channel cap
    ///
    /// Missing or unreadable state yields an empty collection.
    async fn load(&self, channel: &Channel) -> Vec<Item>;

    /// Atomically replace the collection; prior state survives a failed write
    async fn save(&self, channel: &Channel, items: &[Item]) -> Result<(), StoreError>;
}

/// Port receiving the notable points of every channel run
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, channel: &str, event: &RunEvent);
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
