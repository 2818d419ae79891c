//! feedbrief adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `fetch`: HTTP and stub feed fetchers
//! - `feed_xml`: feed parsing and RSS rendering
//! - `store`: filesystem and in-memory channel stores
//! - `llm`: summarizer adapters (OpenAI-compatible, stub)
//! - `run_log`: event sinks (tracing, per-channel log files)
//! - `index_page`: static index of all channel feeds

mod fetch_http;
pub mod feed_xml;
pub mod index_page;
pub mod llm;
pub mod run_log;
mod store_fs;
mod store_memory;

/// Re-exports for fetch adapters
pub mod fetch {
    pub use crate::fetch_http::{HttpFeedFetcher, StubFeedFetcher};
}

/// Re-exports for store adapters
pub mod store {
    pub use crate::store_fs::{FsChannelStore, feed_file_name};
    pub use crate::store_memory::InMemoryChannelStore;
}
