//! In-memory channel store for testing and dry runs

use async_trait::async_trait;
use feedbrief_domain::{Channel, ChannelStore, Item, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory channel store implementation
#[derive(Default)]
pub struct InMemoryChannelStore {
    collections: RwLock<HashMap<String, Vec<Item>>>,
}

impl InMemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a channel's collection
    pub fn items(&self, channel_name: &str) -> Vec<Item> {
        self.collections
            .read()
            .map(|c| c.get(channel_name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChannelStore for InMemoryChannelStore {
    async fn load(&self, channel: &Channel) -> Vec<Item> {
        let mut items = self.items(&channel.name);
        items.truncate(channel.max_total_items);
        items
    }

    async fn save(&self, channel: &Channel, items: &[Item]) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        collections.insert(channel.name.clone(), items.to_vec());
        Ok(())
    }
}
