// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-backed rate limiter for provider invocations.
//!
//! A single key holds the epoch millis of the last attempt. The key expires
//! `min_interval + grace` after it was written, so an absent key means
//! "permitted". Check and record are separate calls and not atomic; two
//! instances racing may both invoke the provider once within a window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use musing_core::KeyValueStore;
use tracing::{debug, warn};

/// Shared handle deciding whether the provider may be called now.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    key: String,
    min_interval: Duration,
    grace: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: String,
        min_interval: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            store,
            key,
            min_interval,
            grace,
        }
    }

    /// Whether an invocation is permitted at `now`.
    ///
    /// Fails open: an unreadable marker counts as permitted.
    pub async fn permitted_at(&self, now: DateTime<Utc>) -> bool {
        let raw = match self.store.get(&self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "rate limit read failed, permitting generation");
                return true;
            }
        };
        let Some(raw) = raw else {
            return true;
        };
        let Ok(last_millis) = raw.trim().parse::<i64>() else {
            warn!(value = %raw, "unparsable rate limit marker, permitting generation");
            return true;
        };
        let elapsed = now.timestamp_millis().saturating_sub(last_millis);
        let min = i64::try_from(self.min_interval.as_millis()).unwrap_or(i64::MAX);
        elapsed >= min
    }

    /// Overwrites the marker with `now`. Failures are logged only.
    pub async fn record_attempt_at(&self, now: DateTime<Utc>) {
        let ttl = self.min_interval + self.grace;
        let millis = now.timestamp_millis().to_string();
        match self.store.set(&self.key, &millis, Some(ttl)).await {
            Ok(()) => debug!(at = %now, "generation attempt recorded"),
            Err(e) => warn!(error = %e, "failed to record generation attempt"),
        }
    }

    pub async fn record_attempt(&self) {
        self.record_attempt_at(Utc::now()).await
    }

    /// Checks and, when permitted, records an attempt at `now`.
    pub async fn try_claim_at(&self, now: DateTime<Utc>) -> bool {
        if !self.permitted_at(now).await {
            return false;
        }
        self.record_attempt_at(now).await;
        true
    }

    pub async fn try_claim(&self) -> bool {
        self.try_claim_at(Utc::now()).await
    }
}
