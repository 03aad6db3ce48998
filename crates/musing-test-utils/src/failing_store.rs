// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A key-value store that is configured but unreachable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use musing_core::traits::adapter::PluginAdapter;
use musing_core::traits::store::KeyValueStore;
use musing_core::types::{AdapterType, HealthStatus};
use musing_core::{MusingError, StoreError};

/// Every operation fails with `StoreError::Unreachable`.
#[derive(Debug, Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations attempted against the store.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, op: &str) -> Result<T, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unreachable {
            message: format!("{op}: connection refused"),
            source: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for FailingStore {
    fn name(&self) -> &str {
        "failing-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        Ok(HealthStatus::Unhealthy("connection refused".into()))
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        self.fail("get")
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), StoreError> {
        self.fail("set")
    }

    async fn incr(&self, _key: &str) -> Result<i64, StoreError> {
        self.fail("incr")
    }

    async fn sorted_add(&self, _key: &str, _score: f64, _member: &str) -> Result<(), StoreError> {
        self.fail("zadd")
    }

    async fn sorted_range_rev(
        &self,
        _key: &str,
        _start: usize,
        _stop: usize,
    ) -> Result<Vec<String>, StoreError> {
        self.fail("zrevrange")
    }

    async fn sorted_len(&self, _key: &str) -> Result<usize, StoreError> {
        self.fail("zcard")
    }

    async fn sorted_trim(&self, _key: &str, _keep: usize) -> Result<usize, StoreError> {
        self.fail("zremrangebyrank")
    }

    async fn list_push(&self, _key: &str, _value: &str) -> Result<usize, StoreError> {
        self.fail("rpush")
    }

    async fn list_pop(&self, _key: &str) -> Result<Option<String>, StoreError> {
        self.fail("lpop")
    }

    async fn list_len(&self, _key: &str) -> Result<usize, StoreError> {
        self.fail("llen")
    }
}
