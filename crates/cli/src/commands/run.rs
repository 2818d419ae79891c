//! Run command - one aggregation pass over the configured channels

use anyhow::{Context, Result, bail};
use feedbrief_adapters::{
    feed_xml::FeedRsParser,
    fetch::HttpFeedFetcher,
    index_page::{IndexEntry, write_index},
    llm::StubSummarizer,
    run_log::{FanoutEventSink, FileRunLog, TracingEventSink},
    store::{FsChannelStore, InMemoryChannelStore},
};
use feedbrief_domain::usecases::{AggregateError, Aggregator};
use feedbrief_domain::{
    Channel, ChannelStore, Clock, EventSink, RunPhase, RunStats, Summarizer, SystemClock,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::commands::summarize::build_summarizer;
use crate::config::AppConfig;

/// JSON view of one channel's result
#[derive(Serialize)]
struct ChannelOutcome<'a> {
    channel: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<RunStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_phase: Option<RunPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> ChannelOutcome<'a> {
    fn new(channel: &'a str, result: &Result<RunStats, AggregateError>) -> Self {
        match result {
            Ok(stats) => Self {
                channel,
                stats: Some(*stats),
                failed_phase: None,
                error: None,
            },
            Err(e) => Self {
                channel,
                stats: None,
                failed_phase: Some(e.phase()),
                error: Some(e.to_string()),
            },
        }
    }
}

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let channels = config.channels().context("Invalid channel configuration")?;
    let selected = select_channels(&channels, &args.channels)?;

    if selected.is_empty() {
        println!("No channels configured.");
        return Ok(());
    }

    let base_dir = config.general.base_dir.clone();
    let summarizer: Arc<dyn Summarizer> = if args.dry_run {
        Arc::new(StubSummarizer::disabled())
    } else {
        build_summarizer(&config)?
    };

    tracing::info!(
        channels = selected.len(),
        base_dir = %base_dir.display(),
        provider = %config.llm.provider,
        summaries = summarizer.is_enabled(),
        dry_run = args.dry_run,
        "Starting feedbrief run"
    );

    // Build dependencies
    let clock = Arc::new(SystemClock);
    let fetcher = Arc::new(
        HttpFeedFetcher::new(Duration::from_secs(config.general.fetch_timeout_secs))
            .context("Failed to build feed fetcher")?,
    );
    let fs_store = FsChannelStore::new(&base_dir);
    let store: Arc<dyn ChannelStore> = if args.dry_run {
        Arc::new(stage_collections(&fs_store, &selected).await?)
    } else {
        Arc::new(fs_store)
    };
    let mut sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(TracingEventSink)];
    if !args.dry_run {
        sinks.push(Arc::new(FileRunLog::new(
            &base_dir,
            clock.clone() as Arc<dyn Clock>,
        )));
    }
    let events = Arc::new(FanoutEventSink::new(sinks));

    let aggregator = Aggregator::new(
        fetcher,
        Arc::new(FeedRsParser),
        summarizer,
        store,
        events,
        clock.clone(),
        config.aggregate_config(),
    );

    let results = aggregator.run_all(&selected).await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if args.json {
        let outcomes: Vec<ChannelOutcome> = results
            .iter()
            .map(|(name, result)| ChannelOutcome::new(name, result))
            .collect();
        let json =
            serde_json::to_string_pretty(&outcomes).context("Failed to serialize run results")?;
        println!("{}", json);
    } else {
        for (name, result) in &results {
            match result {
                Ok(stats) => println!(
                    "{}: {} new, {} summarized, {} summary failures, {} total",
                    name, stats.appended, stats.summarized, stats.summary_failed, stats.total
                ),
                Err(e) => println!("{}: FAILED: {}", name, e),
            }
        }
    }

    if !args.dry_run {
        let index_entries: Vec<IndexEntry> = channels
            .iter()
            .map(|c| IndexEntry {
                name: c.name.clone(),
                sources: c.sources.clone(),
            })
            .collect();
        if let Err(e) = write_index(
            &base_dir,
            &index_entries,
            &config.general.deployment_url,
            clock.now(),
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to write index page");
        }
    }

    if failed == results.len() {
        bail!("All {} selected channels failed", failed);
    }

    Ok(())
}

/// Copy the stored collections into memory so a dry run dedupes against them
async fn stage_collections(
    store: &FsChannelStore,
    channels: &[Channel],
) -> Result<InMemoryChannelStore> {
    let staged = InMemoryChannelStore::new();
    for channel in channels {
        let items = store.load(channel).await;
        staged
            .save(channel, &items)
            .await
            .with_context(|| format!("Failed to stage collection of {}", channel.name))?;
    }
    Ok(staged)
}

/// Channels named with `--channel`, or all of them when none are named
fn select_channels(channels: &[Channel], names: &[String]) -> Result<Vec<Channel>> {
    if names.is_empty() {
        return Ok(channels.to_vec());
    }

    names
        .iter()
        .map(|name| {
            channels
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .with_context(|| format!("Unknown channel: {}", name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> Channel {
        Channel {
            name: name.to_string(),
            sources: vec![format!("https://{}.example/rss", name)],
            filter: None,
            max_new_items_per_run: 1,
            max_total_items: 10,
        }
    }

    #[test]
    fn no_selection_runs_every_channel() {
        let channels = vec![channel("a"), channel("b")];
        let selected = select_channels(&channels, &[]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn selection_keeps_requested_order() {
        let channels = vec![channel("a"), channel("b")];
        let selected = select_channels(&channels, &["b".to_string(), "a".to_string()]).unwrap();
        let names: Vec<_> = selected.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let channels = vec![channel("a")];
        assert!(select_channels(&channels, &["zzz".to_string()]).is_err());
    }
}
