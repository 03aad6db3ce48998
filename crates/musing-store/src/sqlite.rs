// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `KeyValueStore` trait.
//!
//! Expired string values are filtered on read and purged lazily on write.

use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use musing_core::{
    AdapterType, HealthStatus, KeyValueStore, MusingError, PluginAdapter, StoreError,
};

use crate::database::{Database, map_tr_err};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn to_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// SQLite-backed key-value store for single-node deployments.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database file at `path`, running migrations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path).await?))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        let now = now_millis();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![key, now],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        let now = now_millis();
        let expires_at =
            ttl.map(|t| now.saturating_add(i64::try_from(t.as_millis()).unwrap_or(i64::MAX)));
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                conn.execute(
                    "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    expires_at = excluded.expires_at",
                    params![key, value, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let owned = key.to_string();
        let now = now_millis();
        // `None` means the stored value is not an integer; the transaction
        // is dropped without commit and nothing changes.
        let next = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
                let key = owned;
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM kv WHERE key = ?1 AND expires_at IS NOT NULL AND expires_at <= ?2",
                    params![key, now],
                )?;
                let current: Option<String> = tx
                    .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                        row.get(0)
                    })
                    .optional()?;
                let current = match current {
                    Some(value) => match value.trim().parse::<i64>() {
                        Ok(n) => n,
                        Err(_) => return Ok(None),
                    },
                    None => 0,
                };
                let next = current.saturating_add(1);
                tx.execute(
                    "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, NULL)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, next.to_string()],
                )?;
                tx.commit()?;
                Ok(Some(next))
            })
            .await
            .map_err(map_tr_err)?;
        next.ok_or_else(|| StoreError::Codec(format!("value at {key} is not an integer")))
    }

    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        let member = member.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO sorted_members (key, member, score) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key, member) DO UPDATE SET score = excluded.score",
                    params![key, member, score],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
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
        let key = key.to_string();
        let limit = i64::try_from(stop - start + 1).unwrap_or(i64::MAX);
        let offset = i64::try_from(start).unwrap_or(i64::MAX);
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT member FROM sorted_members WHERE key = ?1
                     ORDER BY score DESC, member DESC
                     LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt.query_map(params![key, limit, offset], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn sorted_len(&self, key: &str) -> Result<usize, StoreError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sorted_members WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
            })
            .await
            .map(to_count)
            .map_err(map_tr_err)
    }

    async fn sorted_trim(&self, key: &str, keep: usize) -> Result<usize, StoreError> {
        let key = key.to_string();
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        self.db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                let total: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM sorted_members WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )?;
                let excess = total - keep;
                if excess <= 0 {
                    return Ok(0);
                }
                let removed = tx.execute(
                    "DELETE FROM sorted_members WHERE rowid IN (
                         SELECT rowid FROM sorted_members WHERE key = ?1
                         ORDER BY score ASC, member ASC
                         LIMIT ?2
                     )",
                    params![key, excess],
                )?;
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO list_items (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
                conn.query_row(
                    "SELECT COUNT(*) FROM list_items WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
            })
            .await
            .map(to_count)
            .map_err(map_tr_err)
    }

    async fn list_pop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let tx = conn.transaction()?;
                let head: Option<(i64, String)> = tx
                    .query_row(
                        "SELECT id, value FROM list_items WHERE key = ?1 ORDER BY id ASC LIMIT 1",
                        params![key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                let Some((id, value)) = head else {
                    return Ok(None);
                };
                tx.execute("DELETE FROM list_items WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(Some(value))
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM list_items WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
            })
            .await
            .map(to_count)
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn identity() {
        let store = store().await;
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Store);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn set_get_overwrite() {
        let store = store().await;
        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1", None).await.unwrap();
        store.set("a", "2", None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn expired_values_read_as_missing() {
        let store = store().await;
        store
            .set("short", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        store
            .set("long", "v", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(40));
        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn incr_starts_at_one() {
        let store = store().await;
        assert_eq!(store.incr("visits").await.unwrap(), 1);
        assert_eq!(store.incr("visits").await.unwrap(), 2);
        assert_eq!(store.get("visits").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn incr_rejects_text_and_leaves_it_alone() {
        let store = store().await;
        store.set("label", "abc", None).await.unwrap();
        assert!(matches!(store.incr("label").await, Err(StoreError::Codec(_))));
        assert_eq!(store.get("label").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn sorted_set_orders_descending_and_trims_lowest() {
        let store = store().await;
        for (score, member) in [(3.0, "c"), (1.0, "a"), (2.0, "b"), (4.0, "d")] {
            store.sorted_add("t", score, member).await.unwrap();
        }
        assert_eq!(store.sorted_len("t").await.unwrap(), 4);
        assert_eq!(
            store.sorted_range_rev("t", 0, 10).await.unwrap(),
            vec!["d", "c", "b", "a"]
        );
        assert_eq!(store.sorted_range_rev("t", 1, 2).await.unwrap(), vec!["c", "b"]);

        assert_eq!(store.sorted_trim("t", 2).await.unwrap(), 2);
        assert_eq!(store.sorted_trim("t", 2).await.unwrap(), 0);
        assert_eq!(
            store.sorted_range_rev("t", 0, 10).await.unwrap(),
            vec!["d", "c"]
        );
    }

    #[tokio::test]
    async fn sorted_add_rescores_existing_member() {
        let store = store().await;
        store.sorted_add("t", 1.0, "x").await.unwrap();
        store.sorted_add("t", 5.0, "y").await.unwrap();
        store.sorted_add("t", 9.0, "x").await.unwrap();
        assert_eq!(store.sorted_len("t").await.unwrap(), 2);
        assert_eq!(store.sorted_range_rev("t", 0, 0).await.unwrap(), vec!["x"]);
    }

    #[tokio::test]
    async fn list_is_fifo() {
        let store = store().await;
        assert_eq!(store.list_push("q", "one").await.unwrap(), 1);
        assert_eq!(store.list_push("q", "two").await.unwrap(), 2);
        assert_eq!(store.list_len("q").await.unwrap(), 2);
        assert_eq!(store.list_pop("q").await.unwrap().as_deref(), Some("one"));
        assert_eq!(store.list_pop("q").await.unwrap().as_deref(), Some("two"));
        assert_eq!(store.list_pop("q").await.unwrap(), None);
        assert_eq!(store.list_len("q").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteStore::open(path).await.unwrap();
            store.list_push("q", "kept").await.unwrap();
            store.shutdown().await.unwrap();
        }
        let store = SqliteStore::open(path).await.unwrap();
        assert_eq!(store.list_pop("q").await.unwrap().as_deref(), Some("kept"));
    }
}
