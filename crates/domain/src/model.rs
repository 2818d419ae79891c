//! Domain models and value objects

use serde::Serialize;
use time::OffsetDateTime;

use crate::filter::FilterRule;

/// One entry as provided by a source feed, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    /// Entry link as published by the feed
    pub link: Option<String>,
    /// Entry title
    pub title: Option<String>,
    /// Structured content field (full article markup)
    pub content: Option<String>,
    /// Description / summary field of the feed
    pub description: Option<String>,
    /// Publish (or update) time reported by the feed
    pub published_at: Option<OffsetDateTime>,
}

/// A normalized feed entry flowing through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Link with any fragment removed; identity within a channel
    pub link: String,
    pub title: String,
    /// Source markup
    pub raw_body: String,
    /// Plain text produced by the content cleaner
    pub clean_body: String,
    pub published_at: OffsetDateTime,
}

/// One persisted item of a channel collection
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Unique identity key within a channel
    pub link: String,
    pub title: String,
    /// Displayed body: cleaned text, or a marked excerpt when summarization failed
    pub body: String,
    /// Generated summary, present only when summarization ran and succeeded
    pub summary: Option<String>,
    pub published_at: OffsetDateTime,
}

/// A named, independently configured aggregation unit
#[derive(Debug, Clone)]
pub struct Channel {
    /// Identifier, also used as the storage key
    pub name: String,
    /// Source feed URLs, processed in order
    pub sources: Vec<String>,
    /// Optional inclusion/exclusion rule
    pub filter: Option<FilterRule>,
    /// Maximum summarization calls per run
    pub max_new_items_per_run: usize,
    /// Retention cap of the persisted collection
    pub max_total_items: usize,
}

/// Counters reported at the end of a channel run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Items loaded from the persisted collection
    pub existing: usize,
    /// Entries returned by all sources
    pub fetched: usize,
    /// Sources that failed to fetch or parse
    pub failed_sources: usize,
    /// Entries dropped for lacking a link
    pub missing_link: usize,
    /// Entries dropped as duplicates
    pub duplicates: usize,
    /// Entries dropped by the filter rule
    pub filtered: usize,
    /// Entries that received a summary
    pub summarized: usize,
    /// Entries whose summarization failed
    pub summary_failed: usize,
    /// New items present in the saved collection
    pub appended: usize,
    /// Final length of the persisted collection
    pub total: usize,
}

/// Stages of a channel run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    Fetching,
    Normalizing,
    Deduping,
    Filtering,
    Summarizing,
    Merging,
    Persisted,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Init => "init",
            RunPhase::Fetching => "fetching",
            RunPhase::Normalizing => "normalizing",
            RunPhase::Deduping => "deduping",
            RunPhase::Filtering => "filtering",
            RunPhase::Summarizing => "summarizing",
            RunPhase::Merging => "merging",
            RunPhase::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Why an entry did not make it into the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Duplicate,
    Filtered,
    MissingLink,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Duplicate => f.write_str("duplicate"),
            DropReason::Filtered => f.write_str("filtered"),
            DropReason::MissingLink => f.write_str("missing link"),
        }
    }
}

/// Notable points of a channel run, emitted to an [`crate::EventSink`]
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted { existing: usize },
    FetchAttempted { url: String },
    FetchFailed { url: String, error: String },
    ItemDropped { link: String, title: String, reason: DropReason },
    ItemSummarized { link: String },
    SummaryFailed { link: String, error: String },
    ItemAppended { link: String, title: String },
    RunCompleted { stats: RunStats },
    RunFailed { phase: RunPhase, error: String },
}

impl std::fmt::Display for RunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunEvent::RunStarted { existing } => write!(f, "Started, existing entries: {existing}"),
            RunEvent::FetchAttempted { url } => write!(f, "Fetching from {url}"),
            RunEvent::FetchFailed { url, error } => write!(f, "Fetch failed from {url}: {error}"),
            RunEvent::ItemDropped {
                link,
                title,
                reason,
            } => write!(f, "Drop ({reason}): [{title}]({link})"),
            RunEvent::ItemSummarized { link } => write!(f, "Summarized: {link}"),
            RunEvent::SummaryFailed { link, error } => {
                write!(f, "Summarization failed for {link}, kept excerpt: {error}")
            }
            RunEvent::ItemAppended { link, title } => write!(f, "Append: [{title}]({link})"),
            RunEvent::RunCompleted { stats } => write!(
                f,
                "Finished: fetched={} missing_link={} duplicates={} filtered={} summarized={} summary_failed={} appended={} total={}",
                stats.fetched,
                stats.missing_link,
                stats.duplicates,
                stats.filtered,
                stats.summarized,
                stats.summary_failed,
                stats.appended,
                stats.total
            ),
            RunEvent::RunFailed { phase, error } => write!(f, "Failed while {phase}: {error}"),
        }
    }
}

/// Input for one summarization request
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Cleaned source text
    pub text: String,
    /// Output language (e.g. "en", "zh")
    pub language: String,
    /// Number of keywords to extract before the summary
    pub keyword_count: usize,
    /// Word budget of the summary body
    pub max_words: usize,
}

impl SummaryRequest {
    /// Output length ceiling: twice the word budget plus room for keywords and formatting
    pub fn max_output_tokens(&self) -> u32 {
        let budget = self.max_words.saturating_mul(2).saturating_add(100);
        u32::try_from(budget).unwrap_or(u32::MAX)
    }
}

/// Token preceding the summary body in generated text
pub const SUMMARY_DELIMITER: &str = "<br><br>Summary:";

/// Split generated text into (keywords, summary body) at [`SUMMARY_DELIMITER`]
///
/// Text without the delimiter is returned entirely as the body.
pub fn split_summary(text: &str) -> (Option<&str>, &str) {
    match text.split_once(SUMMARY_DELIMITER) {
        Some((keywords, body)) => {
            let keywords = keywords.trim();
            let keywords = (!keywords.is_empty()).then_some(keywords);
            (keywords, body.trim())
        }
        None => (None, text.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_summary_separates_keywords() {
        let (keywords, body) = split_summary("rust, async <br><br>Summary: - point one");
        assert_eq!(keywords, Some("rust, async"));
        assert_eq!(body, "- point one");
    }

    #[test]
    fn split_summary_without_delimiter_is_all_body() {
        let (keywords, body) = split_summary("  just prose ");
        assert_eq!(keywords, None);
        assert_eq!(body, "just prose");
    }

    #[test]
    fn output_ceiling_doubles_word_budget() {
        let request = SummaryRequest {
            text: String::new(),
            language: "en".to_string(),
            keyword_count: 5,
            max_words: 200,
        };
        assert_eq!(request.max_output_tokens(), 500);
    }
}
