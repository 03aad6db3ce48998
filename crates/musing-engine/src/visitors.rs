// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Site visitor counter. Never fails: no store or a store error reads as 0.

use std::sync::Arc;

use musing_core::KeyValueStore;
use tracing::warn;

#[derive(Clone)]
pub struct VisitorCounter {
    store: Option<Arc<dyn KeyValueStore>>,
    key: String,
}

impl VisitorCounter {
    pub fn new(store: Option<Arc<dyn KeyValueStore>>, key: String) -> Self {
        Self { store, key }
    }

    pub async fn get(&self) -> i64 {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.get(&self.key).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key = %self.key, value = %raw, "visitor count is not an integer");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read visitor count");
                0
            }
        }
    }

    /// Records one visit and returns the new total.
    pub async fn incr(&self) -> i64 {
        let Some(store) = &self.store else {
            return 0;
        };
        store.incr(&self.key).await.unwrap_or_else(|e| {
            warn!(key = %self.key, error = %e, "failed to increment visitor count");
            0
        })
    }
}
