//! Aggregation use case - fetch, dedupe, filter, summarize and merge one channel

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    clean::{clean, truncate_chars},
    filter,
    model::{Channel, DropReason, Entry, Item, RawEntry, RunEvent, RunPhase, RunStats},
    ports::{ChannelStore, Clock, EventSink, FeedFetcher, FeedParser, StoreError, Summarizer},
    usecases::summarize::{SummarizeUseCase, SummaryConfig},
};

/// Characters of body text used as a title when the feed has none
const TITLE_FROM_BODY_CHARS: usize = 50;

/// Configuration for the aggregator
#[derive(Debug, Clone, Default)]
pub struct AggregateConfig {
    pub summary: SummaryConfig,
}

/// Channel-level failure; the prior persisted collection is left intact
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Failed to persist channel '{channel}': {source}")]
    Persistence {
        channel: String,
        #[source]
        source: StoreError,
    },
}

impl AggregateError {
    pub fn phase(&self) -> RunPhase {
        match self {
            AggregateError::Persistence { .. } => RunPhase::Merging,
        }
    }
}

/// Aggregation pipeline orchestrator
pub struct Aggregator<F, P, S, St, E, Cl>
where
    F: FeedFetcher + ?Sized,
    P: FeedParser + ?Sized,
    S: Summarizer + ?Sized,
    St: ChannelStore + ?Sized,
    E: EventSink + ?Sized,
    Cl: Clock + ?Sized,
{
    fetcher: Arc<F>,
    parser: Arc<P>,
    summarizer: Arc<S>,
    store: Arc<St>,
    events: Arc<E>,
    clock: Arc<Cl>,
    config: AggregateConfig,
}

impl<F, P, S, St, E, Cl> Aggregator<F, P, S, St, E, Cl>
where
    F: FeedFetcher + ?Sized,
    P: FeedParser + ?Sized,
    S: Summarizer + ?Sized,
    St: ChannelStore + ?Sized,
    E: EventSink + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        fetcher: Arc<F>,
        parser: Arc<P>,
        summarizer: Arc<S>,
        store: Arc<St>,
        events: Arc<E>,
        clock: Arc<Cl>,
        config: AggregateConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            summarizer,
            store,
            events,
            clock,
            config,
        }
    }

    /// Run every channel in order; a failed channel never stops the others
    pub async fn run_all(
        &self,
        channels: &[Channel],
    ) -> Vec<(String, Result<RunStats, AggregateError>)> {
        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let result = self.run_channel(channel).await;
            if let Err(e) = &result {
                tracing::error!(channel = %channel.name, error = %e, "Channel run failed");
            }
            results.push((channel.name.clone(), result));
        }

        results
    }

    /// Run the pipeline once for a single channel
    pub async fn run_channel(&self, channel: &Channel) -> Result<RunStats, AggregateError> {
        let mut stats = RunStats::default();

        self.enter(channel, RunPhase::Init);
        let mut existing = self.store.load(channel).await;
        existing.truncate(channel.max_total_items);
        stats.existing = existing.len();
        self.emit(channel, RunEvent::RunStarted {
            existing: existing.len(),
        })
        .await;

        self.enter(channel, RunPhase::Fetching);
        let raw_entries = self.fetch_sources(channel, &mut stats).await;

        self.enter(channel, RunPhase::Normalizing);
        let entries = self.normalize(channel, raw_entries, &mut stats).await;

        self.enter(channel, RunPhase::Deduping);
        let entries = self.dedupe(channel, &existing, entries, &mut stats).await;

        self.enter(channel, RunPhase::Filtering);
        let entries = self.apply_filter(channel, entries, &mut stats).await;

        self.enter(channel, RunPhase::Summarizing);
        let new_items = self.summarize(channel, entries, &mut stats).await;

        self.enter(channel, RunPhase::Merging);
        let new_count = new_items.len();
        let merged = merge(new_items, existing, channel.max_total_items);
        // New items lead the merged collection; any cut by the cap were never stored
        stats.appended = new_count.min(merged.len());

        if let Err(source) = self.store.save(channel, &merged).await {
            let error = AggregateError::Persistence {
                channel: channel.name.clone(),
                source,
            };
            self.emit(channel, RunEvent::RunFailed {
                phase: error.phase(),
                error: error.to_string(),
            })
            .await;
            return Err(error);
        }

        self.enter(channel, RunPhase::Persisted);
        for item in &merged[..stats.appended] {
            self.emit(channel, RunEvent::ItemAppended {
                link: item.link.clone(),
                title: item.title.clone(),
            })
            .await;
        }
        stats.total = merged.len();
        self.emit(channel, RunEvent::RunCompleted { stats }).await;

        tracing::info!(
            channel = %channel.name,
            fetched = stats.fetched,
            missing_link = stats.missing_link,
            duplicates = stats.duplicates,
            filtered = stats.filtered,
            summarized = stats.summarized,
            summary_failed = stats.summary_failed,
            appended = stats.appended,
            total = stats.total,
            "Channel run complete"
        );

        Ok(stats)
    }

    /// Fetch and parse every source in configured order, skipping failures
    async fn fetch_sources(&self, channel: &Channel, stats: &mut RunStats) -> Vec<RawEntry> {
        let mut entries = Vec::new();

        for url in &channel.sources {
            self.emit(channel, RunEvent::FetchAttempted { url: url.clone() })
                .await;

            let parsed = match self.fetcher.fetch(url).await {
                Ok(payload) => self.parser.parse(&payload).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match parsed {
                Ok(source_entries) => {
                    tracing::debug!(
                        channel = %channel.name,
                        url = %url,
                        count = source_entries.len(),
                        "Fetched source"
                    );
                    stats.fetched += source_entries.len();
                    entries.extend(source_entries);
                }
                Err(error) => {
                    stats.failed_sources += 1;
                    self.emit(channel, RunEvent::FetchFailed {
                        url: url.clone(),
                        error,
                    })
                    .await;
                }
            }
        }

        entries
    }

    async fn normalize(
        &self,
        channel: &Channel,
        raw_entries: Vec<RawEntry>,
        stats: &mut RunStats,
    ) -> Vec<Entry> {
        let now = self.clock.now();
        let mut entries = Vec::with_capacity(raw_entries.len());

        for raw in raw_entries {
            match normalize_entry(&raw, now) {
                Some(entry) => entries.push(entry),
                None => {
                    stats.missing_link += 1;
                    let title = raw.title.unwrap_or_default();
                    self.emit(channel, RunEvent::ItemDropped {
                        link: String::new(),
                        title,
                        reason: DropReason::MissingLink,
                    })
                    .await;
                }
            }
        }

        entries
    }

    /// Drop entries already persisted or already seen earlier in this run
    async fn dedupe(
        &self,
        channel: &Channel,
        existing: &[Item],
        entries: Vec<Entry>,
        stats: &mut RunStats,
    ) -> Vec<Entry> {
        let mut seen: HashSet<String> = existing
            .iter()
            .map(|item| normalize_link(&item.link).to_string())
            .collect();
        let mut unique = Vec::with_capacity(entries.len());

        for entry in entries {
            if seen.insert(entry.link.clone()) {
                unique.push(entry);
            } else {
                stats.duplicates += 1;
                self.emit(channel, RunEvent::ItemDropped {
                    link: entry.link,
                    title: entry.title,
                    reason: DropReason::Duplicate,
                })
                .await;
            }
        }

        unique
    }

    async fn apply_filter(
        &self,
        channel: &Channel,
        entries: Vec<Entry>,
        stats: &mut RunStats,
    ) -> Vec<Entry> {
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            if filter::passes(channel.filter.as_ref(), &entry) {
                kept.push(entry);
            } else {
                stats.filtered += 1;
                self.emit(channel, RunEvent::ItemDropped {
                    link: entry.link,
                    title: entry.title,
                    reason: DropReason::Filtered,
                })
                .await;
            }
        }

        kept
    }

    /// Summarize in order until the per-run quota is used up
    async fn summarize(
        &self,
        channel: &Channel,
        entries: Vec<Entry>,
        stats: &mut RunStats,
    ) -> Vec<Item> {
        let usecase = SummarizeUseCase::new(self.summarizer.as_ref(), self.config.summary.clone());
        let quota = if usecase.is_enabled() {
            channel.max_new_items_per_run
        } else {
            0
        };

        let mut items = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let display_body = if entry.clean_body.is_empty() {
                entry.title.clone()
            } else {
                entry.clean_body.clone()
            };

            let (body, summary) = if index < quota {
                match usecase.summarize(&display_body).await {
                    Ok(summary) => {
                        stats.summarized += 1;
                        self.emit(channel, RunEvent::ItemSummarized {
                            link: entry.link.clone(),
                        })
                        .await;
                        (display_body, Some(summary))
                    }
                    Err(e) => {
                        stats.summary_failed += 1;
                        self.emit(channel, RunEvent::SummaryFailed {
                            link: entry.link.clone(),
                            error: e.to_string(),
                        })
                        .await;
                        (usecase.fallback_excerpt(&display_body), None)
                    }
                }
            } else {
                (display_body, None)
            };

            items.push(Item {
                link: entry.link,
                title: entry.title,
                body,
                summary,
                published_at: entry.published_at,
            });
        }

        items
    }

    fn enter(&self, channel: &Channel, phase: RunPhase) {
        tracing::debug!(channel = %channel.name, phase = %phase, "Entering phase");
    }

    async fn emit(&self, channel: &Channel, event: RunEvent) {
        self.events.emit(&channel.name, &event).await;
    }
}

/// Strip any URL fragment; `https://x/y#z` and `https://x/y` share an identity
pub fn normalize_link(link: &str) -> &str {
    let link = link.trim();
    link.split_once('#').map_or(link, |(base, _)| base)
}

/// First candidate that is present and not blank
pub fn first_present<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

/// Normalize a raw entry; entries without a link have no identity and are dropped
pub fn normalize_entry(raw: &RawEntry, now: time::OffsetDateTime) -> Option<Entry> {
    let link = normalize_link(first_present([raw.link.as_deref()])?);
    if link.is_empty() {
        return None;
    }

    let raw_body = first_present([
        raw.content.as_deref(),
        raw.description.as_deref(),
        raw.title.as_deref(),
    ])
    .unwrap_or_default()
    .to_string();
    let clean_body = clean(&raw_body);

    let body_prefix = truncate_chars(&clean_body, TITLE_FROM_BODY_CHARS).0;
    let title = first_present([raw.title.as_deref(), Some(body_prefix), Some(link)])
        .unwrap_or(link)
        .trim()
        .to_string();

    Some(Entry {
        link: link.to_string(),
        title,
        raw_body,
        clean_body,
        published_at: raw.published_at.unwrap_or(now),
    })
}

/// Prepend new items to the existing ones, keep the first occurrence of each link, cap the length
pub fn merge(new_items: Vec<Item>, existing: Vec<Item>, max_total_items: usize) -> Vec<Item> {
    let mut seen = HashSet::new();
    new_items
        .into_iter()
        .chain(existing)
        .filter(|item| seen.insert(normalize_link(&item.link).to_string()))
        .take(max_total_items)
        .collect()
}
