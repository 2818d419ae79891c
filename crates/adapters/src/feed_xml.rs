//! Feed payload parsing (feed-rs) and RSS 2.0 rendering of channel collections

use feed_rs::model::Entry as FeedEntry;
use feedbrief_domain::{Channel, FeedParser, Item, ParseError, RawEntry, StoreError};
use time::format_description::well_known::Rfc2822;
use time::{OffsetDateTime, UtcOffset};

/// Parser for RSS, Atom and JSON Feed payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedRsParser;

impl FeedParser for FeedRsParser {
    fn parse(&self, payload: &[u8]) -> Result<Vec<RawEntry>, ParseError> {
        let feed = feed_rs::parser::parse(payload)
            .map_err(|e| ParseError(format!("Failed to parse feed: {}", e)))?;

        Ok(feed.entries.into_iter().map(raw_entry).collect())
    }
}

fn raw_entry(entry: FeedEntry) -> RawEntry {
    let link = entry_link(&entry);
    let published_at = entry
        .published
        .or(entry.updated)
        .and_then(|dt| to_offset_date_time(dt.timestamp()));

    RawEntry {
        link,
        title: entry.title.map(|t| t.content),
        content: entry.content.and_then(|c| c.body),
        description: entry.summary.map(|s| s.content),
        published_at,
    }
}

/// Alternate (or unqualified) link of the entry, else its first link, else a URL id
fn entry_link(entry: &FeedEntry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
}

fn to_offset_date_time(unix_seconds: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(unix_seconds).ok()
}

/// Read a persisted collection back into items, in document order
///
/// The persisted form keeps the displayed body in `content:encoded` and the
/// summary, when present, in `description`.
pub fn parse_items(payload: &[u8]) -> Result<Vec<Item>, ParseError> {
    let feed = feed_rs::parser::parse(payload)
        .map_err(|e| ParseError(format!("Failed to parse collection: {}", e)))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry_link(&entry)?;
            let published_at = entry
                .published
                .or(entry.updated)
                .and_then(|dt| to_offset_date_time(dt.timestamp()))
                .unwrap_or_else(OffsetDateTime::now_utc);
            let summary = entry
                .summary
                .map(|s| s.content)
                .filter(|s| !s.trim().is_empty());
            Some(Item {
                title: entry.title.map(|t| t.content).unwrap_or_else(|| link.clone()),
                body: entry.content.and_then(|c| c.body).unwrap_or_default(),
                link,
                summary,
                published_at,
            })
        })
        .collect();

    Ok(items)
}

/// Render a channel collection as an RSS 2.0 document
pub fn render_rss(channel: &Channel, items: &[Item]) -> Result<String, StoreError> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(
        "<rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\">\n",
    );
    out.push_str("<channel>\n");
    out.push_str(&format!("<title>{}</title>\n", escape_xml(&channel.name)));
    out.push_str(&format!(
        "<link>{}</link>\n",
        escape_xml(channel.sources.first().map(String::as_str).unwrap_or_default())
    ));
    out.push_str(&format!(
        "<description>{}</description>\n",
        escape_xml(&format!("Aggregated from {}", channel.sources.join(", ")))
    ));

    for item in items {
        let pub_date = item
            .published_at
            .to_offset(UtcOffset::UTC)
            .format(&Rfc2822)
            .map_err(|e| {
                StoreError::Serialization(format!("Invalid publish time for {}: {}", item.link, e))
            })?;

        out.push_str("<item>\n");
        out.push_str(&format!("<title>{}</title>\n", escape_xml(&item.title)));
        out.push_str(&format!("<link>{}</link>\n", escape_xml(&item.link)));
        out.push_str(&format!(
            "<guid isPermaLink=\"false\">{}</guid>\n",
            escape_xml(&item.link)
        ));
        out.push_str(&format!("<pubDate>{}</pubDate>\n", pub_date));
        if let Some(summary) = &item.summary {
            out.push_str(&format!("<description>{}</description>\n", escape_xml(summary)));
        }
        out.push_str(&format!(
            "<content:encoded>{}</content:encoded>\n",
            escape_xml(&item.body)
        ));
        out.push_str("</item>\n");
    }

    out.push_str("</channel>\n</rss>\n");
    Ok(out)
}

/// Escape text for XML/HTML, dropping characters XML 1.0 does not allow
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 || matches!(c, '\u{FFFE}' | '\u{FFFF}') => {}
            c => escaped.push(c),
        }
    }
    escaped
}
