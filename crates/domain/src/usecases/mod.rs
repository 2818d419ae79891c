//! Application use cases / business logic

pub mod aggregate;
pub mod summarize;

pub use aggregate::{AggregateConfig, AggregateError, Aggregator, merge, normalize_link};
pub use summarize::{FALLBACK_MARKER, SummarizeUseCase, SummaryConfig};
