// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store backends for the Musing generation service.
//!
//! Three implementations of [`KeyValueStore`]: an in-process map, a WAL-mode
//! SQLite file with embedded migrations, and Redis (behind the `redis`
//! feature). [`open_store`] picks one from configuration.

pub mod database;
pub mod memory;
pub mod migrations;
#[cfg(feature = "redis")]
pub mod redis;
pub mod sqlite;

use std::sync::Arc;

use musing_config::model::{StoreBackend, StoreConfig};
use musing_core::{KeyValueStore, MusingError};
use tracing::{info, warn};

pub use database::Database;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis::RedisStore;
pub use sqlite::SqliteStore;

/// Open the configured store backend.
///
/// Returns `Ok(None)` when no store is configured, or when Redis cannot be
/// reached at startup; the service then runs in degraded mode. A SQLite
/// file that cannot be opened is a hard error.
pub async fn open_store(
    config: &StoreConfig,
) -> Result<Option<Arc<dyn KeyValueStore>>, MusingError> {
    match config.backend {
        StoreBackend::None => {
            info!("no store configured, running in degraded mode");
            Ok(None)
        }
        StoreBackend::Memory => {
            info!("using in-memory store");
            Ok(Some(Arc::new(MemoryStore::new())))
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.sqlite_path).await?;
            info!(path = %config.sqlite_path, "using sqlite store");
            Ok(Some(Arc::new(store)))
        }
        StoreBackend::Redis => open_redis(config).await,
    }
}

#[cfg(feature = "redis")]
async fn open_redis(config: &StoreConfig) -> Result<Option<Arc<dyn KeyValueStore>>, MusingError> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or_else(|| MusingError::Config("store.redis_url is required".into()))?;
    match RedisStore::connect(url).await {
        Ok(store) => {
            info!("using redis store");
            Ok(Some(Arc::new(store)))
        }
        Err(e) => {
            warn!(error = %e, "redis unreachable at startup, running in degraded mode");
            Ok(None)
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_config: &StoreConfig) -> Result<Option<Arc<dyn KeyValueStore>>, MusingError> {
    Err(MusingError::Storage {
        source: Box::new(musing_core::StoreError::Codec(
            "redis backend requested but the `redis` feature is disabled".into(),
        )),
    })
}
