//! Event sinks: structured logs, per-channel run log files, fanout

use async_trait::async_trait;
use feedbrief_domain::{Clock, EventSink, RunEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::store_fs::file_stem;

const RUN_SEPARATOR: &str = "------------------------------------------------------------";

/// Forwards run events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, channel: &str, event: &RunEvent) {
        match event {
            RunEvent::FetchFailed { .. } | RunEvent::SummaryFailed { .. } => {
                tracing::warn!(channel = %channel, "{}", event)
            }
            RunEvent::RunFailed { .. } => tracing::error!(channel = %channel, "{}", event),
            RunEvent::RunStarted { .. } | RunEvent::ItemAppended { .. } => {
                tracing::info!(channel = %channel, "{}", event)
            }
            _ => tracing::debug!(channel = %channel, "{}", event),
        }
    }
}

/// Appends timestamped lines to `<dir>/<channel>.log`
pub struct FileRunLog {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl FileRunLog {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path_for(&self, channel: &str) -> PathBuf {
        self.dir.join(format!("{}.log", file_stem(channel)))
    }

    async fn append(&self, path: &Path, lines: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for FileRunLog {
    async fn emit(&self, channel: &str, event: &RunEvent) {
        let timestamp = self
            .clock
            .now()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown-time".to_string());

        let mut lines = String::new();
        if matches!(event, RunEvent::RunStarted { .. }) {
            lines.push_str(RUN_SEPARATOR);
            lines.push('\n');
        }
        lines.push_str(&format!("{} {}\n", timestamp, event));

        let path = self.path_for(channel);
        if let Err(e) = self.append(&path, &lines).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write run log");
        }
    }
}

/// Delivers every event to each inner sink, in order
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl EventSink for FanoutEventSink {
    async fn emit(&self, channel: &str, event: &RunEvent) {
        for sink in &self.sinks {
            sink.emit(channel, event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedbrief_domain::{DropReason, RunStats};
    use tempfile::TempDir;
    use time::OffsetDateTime;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
        }
    }

    struct CountingSink(std::sync::Mutex<Vec<String>>);

    #[async_trait]
    impl EventSink for CountingSink {
        async fn emit(&self, channel: &str, event: &RunEvent) {
            self.0.lock().unwrap().push(format!("{channel}: {event}"));
        }
    }

    #[tokio::test]
    async fn test_file_run_log_appends_timestamped_lines() {
        let dir = TempDir::new().expect("temp dir");
        let log = FileRunLog::new(dir.path(), Arc::new(FixedClock));

        log.emit("news", &RunEvent::RunStarted { existing: 2 }).await;
        log.emit(
            "news",
            &RunEvent::ItemDropped {
                link: "https://example.com/1".to_string(),
                title: "One".to_string(),
                reason: DropReason::Duplicate,
            },
        )
        .await;
        log.emit(
            "news",
            &RunEvent::RunCompleted {
                stats: RunStats::default(),
            },
        )
        .await;

        let contents = tokio::fs::read_to_string(dir.path().join("news.log"))
            .await
            .expect("read log");
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], RUN_SEPARATOR);
        assert_eq!(lines[1], "2023-11-14T22:13:20Z Started, existing entries: 2");
        assert!(lines[2].starts_with("2023-11-14T22:13:20Z Drop ("));
        assert!(lines[2].ends_with("[One](https://example.com/1)"));
        assert!(lines[3].contains("Finished"));
    }

    #[tokio::test]
    async fn test_file_run_log_keeps_previous_runs() {
        let dir = TempDir::new().expect("temp dir");
        let log = FileRunLog::new(dir.path(), Arc::new(FixedClock));

        log.emit("news", &RunEvent::RunStarted { existing: 0 }).await;
        log.emit("news", &RunEvent::RunStarted { existing: 3 }).await;

        let contents = tokio::fs::read_to_string(log.path_for("news"))
            .await
            .expect("read log");
        assert_eq!(contents.matches(RUN_SEPARATOR).count(), 2);
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_sink() {
        let first = Arc::new(CountingSink(Default::default()));
        let second = Arc::new(CountingSink(Default::default()));
        let fanout =
            FanoutEventSink::new(vec![first.clone() as Arc<dyn EventSink>, second.clone()]);

        fanout
            .emit(
                "news",
                &RunEvent::FetchAttempted {
                    url: "https://example.com/rss".to_string(),
                },
            )
            .await;

        assert_eq!(
            first.0.lock().unwrap().as_slice(),
            ["news: Fetching from https://example.com/rss"]
        );
        assert_eq!(second.0.lock().unwrap().len(), 1);
    }
}
