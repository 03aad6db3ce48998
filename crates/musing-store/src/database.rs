// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes the multi-statement operations in
//! [`crate::sqlite`] atomic with respect to each other.

use std::path::Path;
use std::time::Duration;

use musing_core::StoreError;
use tracing::debug;

use crate::migrations;

/// Map a tokio-rusqlite error into the store error taxonomy.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> StoreError {
    StoreError::unreachable("sqlite operation failed", e)
}

/// Handle to an open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::unreachable(format!("cannot create {}", parent.display()), e)
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| StoreError::unreachable(format!("cannot open {path}"), e))?;
        let db = Self { conn };
        db.prepare(true).await?;
        debug!(path, "sqlite database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Contents vanish on drop.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::unreachable("cannot open in-memory database", e))?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal: bool) -> Result<(), StoreError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.busy_timeout(Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<Result<(), StoreError>, rusqlite::Error> {
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/musing.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn migrations_create_tables() {
        let db = Database::open_in_memory().await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for table in ["kv", "list_items", "sorted_members"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("again.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path).await.unwrap());
        Database::open(path).await.unwrap();
    }
}
