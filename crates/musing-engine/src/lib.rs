// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation engine for the Musing service.
//!
//! The [`Engine`] wires the store-backed pieces together:
//! - [`RateLimiter`] gating provider invocations
//! - [`ItemQueue`] of ready-made items, topped up by the [`RefillScheduler`]
//! - [`Timeline`] of everything generated, used for history and fallback
//! - [`Cascade`] serving one item per request
//! - [`Translator`] and [`VisitorCounter`] for the auxiliary endpoints
//!
//! Without a store, only direct generation and uncached translation remain.

pub mod cascade;
pub mod generator;
pub mod keys;
pub mod queue;
pub mod rate_limit;
pub mod refill;
pub mod shutdown;
pub mod timeline;
pub mod translate;
pub mod visitors;

use std::sync::Arc;
use std::time::Duration;

use musing_config::model::MusingConfig;
use musing_core::{
    GeneratedItem, GenerationProvider, HealthStatus, KeyValueStore, ProviderError, ServedItem,
    ServingError, StoreError,
};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub use cascade::{Backing, Cascade};
pub use generator::Generator;
pub use keys::Keys;
pub use queue::ItemQueue;
pub use rate_limit::RateLimiter;
pub use refill::RefillScheduler;
pub use timeline::Timeline;
pub use translate::{Translation, Translator};
pub use visitors::VisitorCounter;

/// One page of the timeline, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<GeneratedItem>,
    pub total: usize,
}

/// Health of the engine's collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineHealth {
    pub provider: HealthStatus,
    /// `None` when running without a store.
    pub store: Option<HealthStatus>,
    /// Queue length, `None` without a store or when it cannot be read.
    pub queue_depth: Option<usize>,
}

impl EngineHealth {
    /// Overall label: the worst of provider and store.
    pub fn status(&self) -> &'static str {
        let statuses = std::iter::once(&self.provider).chain(self.store.as_ref());
        let mut overall = "healthy";
        for status in statuses {
            match status {
                HealthStatus::Unhealthy(_) => return "unhealthy",
                HealthStatus::Degraded(_) => overall = "degraded",
                HealthStatus::Healthy => {}
            }
        }
        overall
    }
}

/// Entry point for request handlers.
#[derive(Clone)]
pub struct Engine {
    cascade: Cascade,
    translator: Translator,
    visitors: VisitorCounter,
    provider: Arc<dyn GenerationProvider>,
    store: Option<Arc<dyn KeyValueStore>>,
    tracker: TaskTracker,
}

impl Engine {
    /// Builds the engine. `store = None` selects degraded mode.
    pub fn new(
        config: &MusingConfig,
        provider: Arc<dyn GenerationProvider>,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let generation = &config.generation;
        let keys = Keys::new(config.store.key_prefix.clone());
        let tracker = TaskTracker::new();
        let generator = Generator::new(provider.clone(), generation.language.clone());

        let backing = store.as_ref().map(|store| {
            let queue = ItemQueue::new(store.clone(), keys.queue());
            let timeline = Timeline::new(
                store.clone(),
                keys.clone(),
                generation.timeline_cap,
                Duration::from_secs(config.store.item_ttl_secs),
            );
            let limiter = RateLimiter::new(
                store.clone(),
                keys.rate_limit(),
                Duration::from_secs(generation.min_interval_secs),
                Duration::from_secs(generation.limiter_grace_secs),
            );
            let refill = RefillScheduler::new(
                queue.clone(),
                timeline.clone(),
                limiter.clone(),
                generator.clone(),
                tracker.clone(),
                generation.low_water_mark,
                generation.context_items,
            );
            Backing {
                queue,
                timeline,
                limiter,
                refill,
                fallback_pool: generation.fallback_pool,
                context_items: generation.context_items,
            }
        });

        if backing.is_none() {
            info!("no store configured, every request generates directly");
        }

        let translator = Translator::new(
            provider.clone(),
            store.clone(),
            keys.clone(),
            Duration::from_secs(generation.translation_ttl_secs),
        );
        let visitors = VisitorCounter::new(store.clone(), keys.visitors());

        Self {
            cascade: Cascade::new(generator, tracker.clone(), backing),
            translator,
            visitors,
            provider,
            store,
            tracker,
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Serves one item through the fallback cascade.
    pub async fn serve(&self) -> Result<ServedItem, ServingError> {
        self.cascade.serve().await
    }

    /// Reads one page of history. `Ok(None)` without a store.
    pub async fn history(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Option<HistoryPage>, StoreError> {
        let Some(backing) = self.cascade.backing() else {
            return Ok(None);
        };
        let total = backing.timeline.total().await?;
        let items = if limit == 0 {
            Vec::new()
        } else {
            backing.timeline.range(offset, limit).await?
        };
        debug!(offset, limit, returned = items.len(), total, "history page");
        Ok(Some(HistoryPage { items, total }))
    }

    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        item_id: Option<&str>,
    ) -> Result<Translation, ProviderError> {
        self.translator.translate(text, target_lang, item_id).await
    }

    pub async fn visitors(&self) -> i64 {
        self.visitors.get().await
    }

    pub async fn record_visit(&self) -> i64 {
        self.visitors.incr().await
    }

    /// Current queue length, `None` without a store or on store failure.
    pub async fn queue_depth(&self) -> Option<usize> {
        let backing = self.cascade.backing()?;
        match backing.queue.size().await {
            Ok(size) => Some(size),
            Err(e) => {
                warn!(error = %e, "queue size unavailable");
                None
            }
        }
    }

    pub async fn health(&self) -> EngineHealth {
        let provider = self
            .provider
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        let store = match &self.store {
            Some(store) => Some(
                store
                    .health_check()
                    .await
                    .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string())),
            ),
            None => None,
        };
        EngineHealth {
            provider,
            store,
            queue_depth: self.queue_depth().await,
        }
    }

    /// Drains background tasks, then shuts the adapters down.
    ///
    /// Returns `true` when every task finished within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let drained = shutdown::drain_tasks(&self.tracker, timeout).await;
        if let Err(e) = self.provider.shutdown().await {
            warn!(error = %e, "provider shutdown failed");
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.shutdown().await {
                warn!(error = %e, "store shutdown failed");
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_is_worst_of_parts() {
        let healthy = EngineHealth {
            provider: HealthStatus::Healthy,
            store: None,
            queue_depth: None,
        };
        assert_eq!(healthy.status(), "healthy");

        let degraded = EngineHealth {
            provider: HealthStatus::Healthy,
            store: Some(HealthStatus::Degraded("slow".into())),
            queue_depth: Some(0),
        };
        assert_eq!(degraded.status(), "degraded");

        let unhealthy = EngineHealth {
            provider: HealthStatus::Degraded("slow".into()),
            store: Some(HealthStatus::Unhealthy("down".into())),
            queue_depth: None,
        };
        assert_eq!(unhealthy.status(), "unhealthy");
    }
}
