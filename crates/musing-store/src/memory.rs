// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local implementation of the `KeyValueStore` trait.
//!
//! Expiry uses `tokio::time::Instant`, so paused-clock tests can advance it.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use musing_core::{
    AdapterType, HealthStatus, KeyValueStore, MusingError, PluginAdapter, StoreError,
};

#[derive(Default)]
struct Inner {
    strings: HashMap<String, (String, Option<Instant>)>,
    /// Members kept sorted ascending by (score, member).
    sorted: HashMap<String, Vec<(f64, String)>>,
    lists: HashMap<String, VecDeque<String>>,
}

impl Inner {
    fn live_string(&mut self, key: &str) -> Option<&String> {
        let expired = matches!(
            self.strings.get(key),
            Some((_, Some(deadline))) if *deadline <= Instant::now()
        );
        if expired {
            self.strings.remove(key);
        }
        self.strings.get(key).map(|(value, _)| value)
    }
}

/// In-memory key-value store. State is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().await.live_string(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let deadline = ttl.map(|t| Instant::now() + t);
        self.inner
            .lock()
            .await
            .strings
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        let current = match inner.live_string(key) {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map_err(|_| StoreError::Codec(format!("value at {key} is not an integer")))?,
            None => 0,
        };
        let next = current.saturating_add(1);
        let deadline = inner.strings.get(key).and_then(|(_, deadline)| *deadline);
        inner
            .strings
            .insert(key.to_string(), (next.to_string(), deadline));
        Ok(next)
    }

    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let set = inner.sorted.entry(key.to_string()).or_default();
        set.retain(|(_, m)| m != member);
        let entry = (score, member.to_string());
        let at = set.partition_point(|slot| {
            slot
                .0
                .total_cmp(&entry.0)
                .then_with(|| slot.1.cmp(&entry.1))
                .is_lt()
        });
        set.insert(at, entry);
        Ok(())
    }

    async fn sorted_range_rev(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<String>, StoreError> {
        if stop < start {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().await;
        Ok(inner
            .sorted
            .get(key)
            .map(|set| {
                set.iter()
                    .rev()
                    .skip(start)
                    .take(stop - start + 1)
                    .map(|(_, member)| member.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sorted_len(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.inner.lock().await.sorted.get(key).map_or(0, Vec::len))
    }

    async fn sorted_trim(&self, key: &str, keep: usize) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(set) = inner.sorted.get_mut(key) else {
            return Ok(0);
        };
        let excess = set.len().saturating_sub(keep);
        set.drain(..excess);
        Ok(excess)
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len())
    }

    async fn list_pop(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .lists
            .get_mut(key)
            .and_then(VecDeque::pop_front))
    }

    async fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.inner.lock().await.lists.get(key).map_or(0, VecDeque::len))
    }
}
