// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-ordered, size-bounded index of every generated item.
//!
//! The index is an ordered set of ids scored by creation millis. Payloads
//! live under separate keys with their own expiry, so an indexed id may
//! outlive its payload; readers skip such holes.

use std::sync::Arc;
use std::time::Duration;

use musing_core::{GeneratedItem, ItemId, KeyValueStore, StoreError};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::keys::Keys;

#[derive(Clone)]
pub struct Timeline {
    store: Arc<dyn KeyValueStore>,
    keys: Keys,
    cap: usize,
    item_ttl: Duration,
}

impl Timeline {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: Keys, cap: usize, item_ttl: Duration) -> Self {
        Self {
            store,
            keys,
            cap,
            item_ttl,
        }
    }

    /// Stores the payload, indexes the id, and trims the index to the cap.
    ///
    /// Appending the same item twice is harmless.
    pub async fn append(&self, item: &GeneratedItem) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(item).map_err(|e| StoreError::Codec(e.to_string()))?;
        self.store
            .set(&self.keys.item(&item.id), &payload, Some(self.item_ttl))
            .await?;
        self.store
            .sorted_add(&self.keys.timeline(), item.score(), item.id.as_str())
            .await?;
        let removed = self.store.sorted_trim(&self.keys.timeline(), self.cap).await?;
        if removed > 0 {
            debug!(removed, cap = self.cap, "timeline trimmed");
        }
        Ok(())
    }

    /// Ids of the newest `count` entries, newest first.
    pub async fn recent(&self, count: usize) -> Result<Vec<ItemId>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .store
            .sorted_range_rev(&self.keys.timeline(), 0, count - 1)
            .await?;
        Ok(ids.into_iter().map(ItemId).collect())
    }

    /// Items at ranks `offset..offset + limit`, newest first.
    pub async fn range(&self, offset: usize, limit: usize) -> Result<Vec<GeneratedItem>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .store
            .sorted_range_rev(&self.keys.timeline(), offset, offset + limit - 1)
            .await?;
        self.load(ids.into_iter().map(ItemId)).await
    }

    /// Texts of the newest `count` items, for continuity context.
    pub async fn recent_texts(&self, count: usize) -> Result<Vec<String>, StoreError> {
        Ok(self
            .range(0, count)
            .await?
            .into_iter()
            .map(|item| item.text)
            .collect())
    }

    pub async fn get(&self, id: &ItemId) -> Result<Option<GeneratedItem>, StoreError> {
        let Some(payload) = self.store.get(&self.keys.item(id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&payload) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                warn!(id = %id, error = %e, "undecodable item payload");
                Ok(None)
            }
        }
    }

    /// Number of indexed ids, including any whose payload has expired.
    pub async fn total(&self) -> Result<usize, StoreError> {
        self.store.sorted_len(&self.keys.timeline()).await
    }

    /// Uniform pick among the newest `pool` entries whose payloads exist.
    pub async fn random_recent(&self, pool: usize) -> Result<Option<GeneratedItem>, StoreError> {
        let ids = self.recent(pool).await?;
        let candidates = self.load(ids.into_iter()).await?;
        let pick = candidates.choose(&mut rand::thread_rng()).cloned();
        Ok(pick)
    }

    async fn load(
        &self,
        ids: impl Iterator<Item = ItemId>,
    ) -> Result<Vec<GeneratedItem>, StoreError> {
        let mut items = Vec::new();
        for id in ids {
            if let Some(item) = self.get(&id).await? {
                items.push(item);
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use musing_core::{Attributes, Flavor, Tone};
    use musing_store::MemoryStore;

    fn item_at(secs: i64, text: &str) -> GeneratedItem {
        let attrs = Attributes {
            flavor: Flavor::ZenClarity,
            tone: Tone::Contemplative,
            intensity: 99,
        };
        let at: DateTime<Utc> = DateTime::from_timestamp(1_750_000_000 + secs, 0).unwrap();
        GeneratedItem::new(text, attrs, at, None)
    }

    fn timeline(store: Arc<dyn KeyValueStore>, cap: usize) -> Timeline {
        Timeline::new(
            store,
            Keys::new("musing"),
            cap,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn newest_first_and_paged() {
        let tl = timeline(Arc::new(MemoryStore::new()), 100);
        for i in 0..5 {
            tl.append(&item_at(i, &format!("t{i}"))).await.unwrap();
        }
        let texts: Vec<_> = tl.range(0, 3).await.unwrap().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["t4", "t3", "t2"]);
        let texts: Vec<_> = tl.range(3, 10).await.unwrap().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["t1", "t0"]);
        assert!(tl.range(10, 5).await.unwrap().is_empty());
        assert!(tl.range(0, 0).await.unwrap().is_empty());
        assert_eq!(tl.total().await.unwrap(), 5);
        assert_eq!(tl.recent_texts(2).await.unwrap(), vec!["t4", "t3"]);
    }

    #[tokio::test]
    async fn append_is_idempotent() {
        let tl = timeline(Arc::new(MemoryStore::new()), 10);
        let item = item_at(0, "once");
        tl.append(&item).await.unwrap();
        tl.append(&item).await.unwrap();
        assert_eq!(tl.total().await.unwrap(), 1);
        assert_eq!(tl.get(&item.id).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn trims_oldest_beyond_cap() {
        let tl = timeline(Arc::new(MemoryStore::new()), 3);
        let items: Vec<_> = (0..5).map(|i| item_at(i, &format!("t{i}"))).collect();
        for item in &items {
            tl.append(item).await.unwrap();
        }
        assert_eq!(tl.total().await.unwrap(), 3);
        let ids = tl.recent(10).await.unwrap();
        assert_eq!(ids, vec![items[4].id.clone(), items[3].id.clone(), items[2].id.clone()]);
    }

    #[tokio::test]
    async fn missing_payloads_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let tl = timeline(store.clone(), 10);
        tl.append(&item_at(0, "kept")).await.unwrap();
        store
            .sorted_add("musing:timeline", 1_750_000_999_000.0, "ghost")
            .await
            .unwrap();
        let items = tl.range(0, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "kept");
        assert_eq!(tl.total().await.unwrap(), 2);
        assert_eq!(tl.random_recent(5).await.unwrap().unwrap().text, "kept");
    }

    #[tokio::test]
    async fn random_recent_on_empty_is_none() {
        let tl = timeline(Arc::new(MemoryStore::new()), 10);
        assert!(tl.random_recent(20).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn random_recent_stays_in_pool() {
        let tl = timeline(Arc::new(MemoryStore::new()), 100);
        for i in 0..10 {
            tl.append(&item_at(i, &format!("t{i}"))).await.unwrap();
        }
        for _ in 0..50 {
            let pick = tl.random_recent(3).await.unwrap().unwrap();
            assert!(["t9", "t8", "t7"].contains(&pick.text.as_str()));
        }
    }

    proptest::proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]
        #[test]
        fn size_never_exceeds_cap(cap in 1usize..20, appends in 0usize..60) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let tl = timeline(Arc::new(MemoryStore::new()), cap);
                for i in 0..appends {
                    tl.append(&item_at(i as i64, "x")).await.unwrap();
                    let total = tl.total().await.unwrap();
                    assert!(total <= cap, "total {total} > cap {cap}");
                }
                assert_eq!(tl.total().await.unwrap(), appends.min(cap));
            });
        }
    }
}
