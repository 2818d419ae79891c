//! Filesystem channel store: one RSS document per channel

use async_trait::async_trait;
use feedbrief_domain::{Channel, ChannelStore, Item, StoreError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::feed_xml::{parse_items, render_rss};

/// File name used for a channel's collection, e.g. `news.xml`
pub fn feed_file_name(channel_name: &str) -> String {
    format!("{}.xml", file_stem(channel_name))
}

/// Channel name reduced to characters safe in a file name
pub fn file_stem(channel_name: &str) -> String {
    channel_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Channel store writing `<base_dir>/<channel>.xml`
#[derive(Debug, Clone)]
pub struct FsChannelStore {
    base_dir: PathBuf,
}

impl FsChannelStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, channel: &Channel) -> PathBuf {
        self.base_dir.join(feed_file_name(&channel.name))
    }

    async fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_dir).await?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("collection.xml");
        let tmp_path = self
            .base_dir
            .join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(e));
        }

        Ok(())
    }
}

#[async_trait]
impl ChannelStore for FsChannelStore {
    async fn load(&self, channel: &Channel) -> Vec<Item> {
        let path = self.path_for(channel);

        let payload = match fs::read(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No stored collection yet");
                return vec![];
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Stored collection unreadable, starting empty"
                );
                return vec![];
            }
        };

        match parse_items(&payload) {
            Ok(mut items) => {
                items.truncate(channel.max_total_items);
                items
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Stored collection corrupt, starting empty"
                );
                vec![]
            }
        }
    }

    async fn save(&self, channel: &Channel, items: &[Item]) -> Result<(), StoreError> {
        let path = self.path_for(channel);
        let document = render_rss(channel, items)?;

        self.write_atomically(&path, document.as_bytes()).await?;
        tracing::debug!(path = %path.display(), items = items.len(), "Saved collection");

        Ok(())
    }
}
