//! Static index page listing every channel feed

use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::feed_xml::escape_xml;
use crate::store_fs::feed_file_name;

/// One row of the index page
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    pub sources: Vec<String>,
}

/// Render the index page; feed links are prefixed with `deployment_url` when set
pub fn render_index(
    entries: &[IndexEntry],
    deployment_url: &str,
    updated_at: OffsetDateTime,
) -> String {
    let updated = updated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| updated_at.to_string());
    let prefix = deployment_url.trim_end_matches('/');

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>feedbrief</title>\n</head>\n<body>\n");
    html.push_str("<h1>Channels</h1>\n<ul>\n");

    for entry in entries {
        let file = feed_file_name(&entry.name);
        let href = if prefix.is_empty() {
            file
        } else {
            format!("{}/{}", prefix, file)
        };

        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a>\n<ul>\n",
            escape_xml(&href),
            escape_xml(&entry.name)
        ));
        for source in &entry.sources {
            html.push_str(&format!("<li>{}</li>\n", escape_xml(source)));
        }
        html.push_str("</ul>\n</li>\n");
    }

    html.push_str("</ul>\n");
    html.push_str(&format!("<p>Updated {}</p>\n", escape_xml(&updated)));
    html.push_str("</body>\n</html>\n");
    html
}

/// Write `<dir>/index.html`
pub async fn write_index(
    dir: &Path,
    entries: &[IndexEntry],
    deployment_url: &str,
    updated_at: OffsetDateTime,
) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join("index.html");
    tokio::fs::write(&path, render_index(entries, deployment_url, updated_at)).await?;
    tracing::debug!(path = %path.display(), channels = entries.len(), "Wrote index page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries() -> Vec<IndexEntry> {
        vec![IndexEntry {
            name: "tech".to_string(),
            sources: vec!["https://a.example/rss?x=1&y=2".to_string()],
        }]
    }

    #[test]
    fn test_relative_links_without_deployment_url() {
        let html = render_index(&entries(), "", OffsetDateTime::UNIX_EPOCH);

        assert!(html.contains("<a href=\"tech.xml\">tech</a>"));
        assert!(html.contains("https://a.example/rss?x=1&amp;y=2"));
        assert!(html.contains("Updated 1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_deployment_url_prefixes_links() {
        let html = render_index(&entries(), "https://feeds.example/", OffsetDateTime::UNIX_EPOCH);

        assert!(html.contains("<a href=\"https://feeds.example/tech.xml\">"));
    }

    #[tokio::test]
    async fn test_write_index_creates_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_index(dir.path(), &entries(), "", OffsetDateTime::UNIX_EPOCH)
            .await
            .expect("write index");

        assert_eq!(path, dir.path().join("index.html"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("tech.xml"));
    }
}
