// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis implementation of the `KeyValueStore` trait.
//!
//! Uses a `ConnectionManager`, which reconnects transparently after drops.
//! Every trait method maps to exactly one Redis command.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;

use musing_core::{
    AdapterType, HealthStatus, KeyValueStore, MusingError, PluginAdapter, StoreError,
};

/// Upper bound on the initial connection, including the manager's retries.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn map_redis_err(e: redis::RedisError) -> StoreError {
    StoreError::unreachable("redis command failed", e)
}

fn rank(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

/// Redis-backed key-value store shared by every service instance.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::unreachable("invalid redis url", e))?;
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|e| StoreError::unreachable("timed out connecting to redis", e))?
            .map_err(|e| StoreError::unreachable("failed to connect to redis", e))?;
        debug!("redis connection established");
        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl PluginAdapter for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        let mut conn = self.conn();
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        Ok(match pong {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            // PX rejects zero.
            let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            cmd.arg("PX").arg(millis);
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(map_redis_err)?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn();
        let value: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| match e.kind() {
                // "ERR value is not an integer or out of range"
                redis::ErrorKind::ResponseError => {
                    StoreError::Codec(format!("value at {key} is not an integer"))
                }
                _ => map_redis_err(e),
            })?;
        Ok(value)
    }

    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let _: i64 = redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
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
        let mut conn = self.conn();
        let members: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(rank(start))
            .arg(rank(stop))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(members)
    }

    async fn sorted_len(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let len: usize = redis::cmd("ZCARD")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(len)
    }

    async fn sorted_trim(&self, key: &str, keep: usize) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        // Ranks are ascending: drop everything below the newest `keep`.
        let removed: usize = redis::cmd("ZREMRANGEBYRANK")
            .arg(key)
            .arg(0)
            .arg(-(rank(keep)) - 1)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(removed)
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let len: usize = redis::cmd("RPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(len)
    }

    async fn list_pop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn();
        let value: Option<String> = redis::cmd("LPOP")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(value)
    }

    async fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let len: usize = redis::cmd("LLEN")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_unreachable() {
        let err = RedisStore::connect("not a url").await.err().unwrap();
        assert!(matches!(err, StoreError::Unreachable { .. }));
    }

    #[test]
    fn rank_saturates() {
        assert_eq!(rank(5), 5);
        assert_eq!(rank(usize::MAX), isize::MAX);
    }
}
