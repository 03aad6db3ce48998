// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait for the queue, timeline, and rate-limit state.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for a primitive key-value store (Redis, SQLite, in-memory).
///
/// Every operation touches exactly one key. No multi-key transactions are
/// offered, so callers must tolerate partially applied multi-step updates.
#[async_trait]
pub trait KeyValueStore: PluginAdapter {
    /// Reads a string value. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a string value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Atomically increments an integer value (missing counts as 0).
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Adds or re-scores `member` in the ordered set at `key`.
    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError>;

    /// Returns members by descending score, ranks `start..=stop` inclusive.
    async fn sorted_range_rev(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Returns the number of members in the ordered set.
    async fn sorted_len(&self, key: &str) -> Result<usize, StoreError>;

    /// Removes the lowest-scored members until at most `keep` remain.
    ///
    /// Idempotent. Returns the number of members removed.
    async fn sorted_trim(&self, key: &str, keep: usize) -> Result<usize, StoreError>;

    /// Appends to the tail of the list at `key`, returning the new length.
    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Removes and returns the head of the list at `key`.
    async fn list_pop(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns the length of the list at `key`.
    async fn list_len(&self, key: &str) -> Result<usize, StoreError>;
}
