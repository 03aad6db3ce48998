// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FIFO buffer of ready-made items held in the store.

use std::sync::Arc;

use musing_core::{GeneratedItem, KeyValueStore, StoreError};
use tracing::warn;

#[derive(Clone)]
pub struct ItemQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ItemQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, key: String) -> Self {
        Self { store, key }
    }

    /// Appends an item to the tail. Returns the new queue length.
    pub async fn push(&self, item: &GeneratedItem) -> Result<usize, StoreError> {
        let payload =
            serde_json::to_string(item).map_err(|e| StoreError::Codec(e.to_string()))?;
        self.store.list_push(&self.key, &payload).await
    }

    /// Pops the head without blocking.
    ///
    /// An undecodable payload is discarded and reported as a miss.
    pub async fn try_pop(&self) -> Result<Option<GeneratedItem>, StoreError> {
        let Some(payload) = self.store.list_pop(&self.key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<GeneratedItem>(&payload) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                warn!(error = %e, "discarding undecodable queue entry");
                Ok(None)
            }
        }
    }

    pub async fn size(&self) -> Result<usize, StoreError> {
        self.store.list_len(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use musing_core::{Attributes, Flavor, Tone};
    use musing_store::MemoryStore;

    fn item(text: &str) -> GeneratedItem {
        let attrs = Attributes {
            flavor: Flavor::PureInspiration,
            tone: Tone::Euphoric,
            intensity: 70,
        };
        GeneratedItem::new(text, attrs, Utc::now(), None)
    }

    #[tokio::test]
    async fn fifo_order() {
        let queue = ItemQueue::new(Arc::new(MemoryStore::new()), "q".into());
        let a = item("a");
        let b = item("b");
        assert_eq!(queue.push(&a).await.unwrap(), 1);
        assert_eq!(queue.push(&b).await.unwrap(), 2);
        assert_eq!(queue.try_pop().await.unwrap(), Some(a));
        assert_eq!(queue.size().await.unwrap(), 1);
        assert_eq!(queue.try_pop().await.unwrap(), Some(b));
        assert_eq!(queue.try_pop().await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.list_push("q", "{not json").await.unwrap();
        let queue = ItemQueue::new(store, "q".into());
        assert_eq!(queue.try_pop().await.unwrap(), None);
        assert_eq!(queue.size().await.unwrap(), 0);
    }
}
