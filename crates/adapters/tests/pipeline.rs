use feedbrief_adapters::{
    feed_xml::FeedRsParser,
    fetch::StubFeedFetcher,
    llm::StubSummarizer,
    run_log::TracingEventSink,
    store::InMemoryChannelStore,
};
use feedbrief_domain::usecases::{AggregateConfig, Aggregator, FALLBACK_MARKER};
use feedbrief_domain::{Channel, SummarizeError, SystemClock};
use std::sync::Arc;

const FEED_URL: &str = "https://feed.example/rss";
const BROKEN_URL: &str = "https://broken.example/rss";

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
<title>Tech</title>
<link>https://feed.example</link>
<description>Tech news</description>
<item>
<title>First</title>
<link>https://feed.example/1</link>
<content:encoded><![CDATA[<p>First body</p>]]></content:encoded>
</item>
<item>
<title>Second</title>
<link>https://feed.example/2</link>
<description>Second body</description>
</item>
</channel>
</rss>"#;

fn channel() -> Channel {
    Channel {
        name: "tech".to_string(),
        sources: vec![FEED_URL.to_string(), BROKEN_URL.to_string()],
        filter: None,
        max_new_items_per_run: 1,
        max_total_items: 10,
    }
}

fn fetcher() -> StubFeedFetcher {
    StubFeedFetcher::new()
        .with_feed(FEED_URL, RSS)
        .with_status(BROKEN_URL, 500)
}

#[tokio::test]
async fn stubbed_pipeline_summarizes_within_quota_and_dedupes_reruns() {
    let store = Arc::new(InMemoryChannelStore::new());
    let aggregator = Aggregator::new(
        Arc::new(fetcher()),
        Arc::new(FeedRsParser),
        Arc::new(StubSummarizer::with_response(
            "rust, feeds <br><br>Summary: - a point",
        )),
        Arc::clone(&store),
        Arc::new(TracingEventSink),
        Arc::new(SystemClock),
        AggregateConfig::default(),
    );

    let stats = aggregator.run_channel(&channel()).await.unwrap();

    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.failed_sources, 1);
    assert_eq!(stats.summarized, 1);
    assert_eq!(stats.appended, 2);
    let items = store.items("tech");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].link, "https://feed.example/1");
    assert_eq!(items[0].body, "First body");
    assert_eq!(
        items[0].summary.as_deref(),
        Some("rust, feeds <br><br>Summary: - a point")
    );
    assert_eq!(items[1].body, "Second body");
    assert!(items[1].summary.is_none());

    let rerun = aggregator.run_channel(&channel()).await.unwrap();

    assert_eq!(rerun.duplicates, 2);
    assert_eq!(rerun.appended, 0);
    assert_eq!(store.items("tech"), items);
}

#[tokio::test]
async fn stubbed_pipeline_keeps_excerpt_when_summarizer_fails() {
    let store = Arc::new(InMemoryChannelStore::new());
    let aggregator = Aggregator::new(
        Arc::new(fetcher()),
        Arc::new(FeedRsParser),
        Arc::new(StubSummarizer::with_error(SummarizeError::RateLimited)),
        Arc::clone(&store),
        Arc::new(TracingEventSink),
        Arc::new(SystemClock),
        AggregateConfig::default(),
    );

    let stats = aggregator.run_channel(&channel()).await.unwrap();

    assert_eq!(stats.summary_failed, 1);
    let items = store.items("tech");
    assert_eq!(items[0].body, format!("{FALLBACK_MARKER} First body"));
    assert!(items[0].summary.is_none());
    assert_eq!(items[1].body, "Second body");
}
