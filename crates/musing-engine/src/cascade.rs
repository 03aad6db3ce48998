// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fallback cascade behind `GET /generate`.
//!
//! Every request resolves to exactly one of: a queued item, a freshly
//! generated item, a replayed timeline item, or a [`ServingError`]. The order
//! of attempts is fixed:
//!
//! 1. Pop the queue. On a hit the item is served at once; the timeline
//!    append happens in the background.
//! 2. After a hit, a background task checks the queue against the low-water
//!    mark and, if the limiter grants the window, refills it.
//! 3. On a miss, if the limiter grants the window, generate synchronously.
//!    The provider call runs on its own task so a dropped request does not
//!    abandon the item.
//! 4. Otherwise, or if generation fails, replay a random recent item.
//!
//! Without a store only step 3 exists, unconditionally.

use musing_core::{GeneratedItem, ProviderError, ServedItem, ServingError};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::generator::Generator;
use crate::queue::ItemQueue;
use crate::rate_limit::RateLimiter;
use crate::refill::RefillScheduler;
use crate::timeline::Timeline;

/// Store-backed collaborators of the cascade.
#[derive(Clone)]
pub struct Backing {
    pub queue: ItemQueue,
    pub timeline: Timeline,
    pub limiter: RateLimiter,
    pub refill: RefillScheduler,
    pub fallback_pool: usize,
    pub context_items: usize,
}

#[derive(Clone)]
pub struct Cascade {
    generator: Generator,
    tracker: TaskTracker,
    backing: Option<Backing>,
}

impl Cascade {
    pub fn new(generator: Generator, tracker: TaskTracker, backing: Option<Backing>) -> Self {
        Self {
            generator,
            tracker,
            backing,
        }
    }

    pub fn backing(&self) -> Option<&Backing> {
        self.backing.as_ref()
    }

    /// Serves one item.
    pub async fn serve(&self) -> Result<ServedItem, ServingError> {
        let result = match &self.backing {
            None => self.serve_direct().await,
            Some(backing) => self.serve_backed(backing).await,
        };

        #[cfg(feature = "prometheus")]
        musing_prometheus::record_serve(match &result {
            Ok(served) if served.cached => "replayed",
            Ok(_) => "fresh",
            Err(ServingError::WarmingUp) => "warming_up",
            Err(ServingError::Unreachable { .. }) => "unreachable",
        });

        result
    }

    async fn serve_direct(&self) -> Result<ServedItem, ServingError> {
        let generator = self.generator.clone();
        let handle = self
            .tracker
            .spawn(async move { generator.generate(Vec::new()).await });
        match handle.await {
            Ok(Ok(item)) => Ok(ServedItem::fresh(item)),
            Ok(Err(e)) => Err(ServingError::Unreachable {
                debug: Some(e.to_string()),
            }),
            Err(e) => Err(ServingError::Unreachable {
                debug: Some(format!("generation task failed: {e}")),
            }),
        }
    }

    async fn serve_backed(&self, backing: &Backing) -> Result<ServedItem, ServingError> {
        match backing.queue.try_pop().await {
            Ok(Some(item)) => {
                debug!(id = %item.id, "serving queued item");
                self.spawn_timeline_append(backing, item.clone());
                backing.refill.top_up();
                return Ok(ServedItem::fresh(item));
            }
            Ok(None) => debug!("queue empty"),
            Err(e) => warn!(error = %e, "queue pop failed, treating as empty"),
        }

        if !backing.limiter.try_claim().await {
            debug!("generation not permitted yet, replaying");
            return self.replay(backing, None).await;
        }

        match self.generate_synchronously(backing).await {
            Ok(item) => Ok(ServedItem::fresh(item)),
            Err(e @ ProviderError::RateLimited { .. }) => {
                info!(error = %e, "provider throttled, replaying");
                self.replay(backing, None).await
            }
            Err(e) => {
                warn!(error = %e, "generation failed, replaying");
                self.replay(backing, Some(e.to_string())).await
            }
        }
    }

    /// Generates on a tracked task and awaits it. The timeline append happens
    /// inside the task, so the item is recorded even if this future is dropped.
    async fn generate_synchronously(&self, backing: &Backing) -> Result<GeneratedItem, ProviderError> {
        let generator = self.generator.clone();
        let timeline = backing.timeline.clone();
        let context_items = backing.context_items;

        let handle = self.tracker.spawn(async move {
            let recent = match timeline.recent_texts(context_items).await {
                Ok(recent) => recent,
                Err(e) => {
                    warn!(error = %e, "context unavailable, generating without it");
                    Vec::new()
                }
            };
            let item = generator.generate(recent).await?;
            if let Err(e) = timeline.append(&item).await {
                warn!(id = %item.id, error = %e, "failed to append generated item");
            }
            Ok::<_, ProviderError>(item)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(ProviderError::Unavailable {
                message: format!("generation task failed: {e}"),
                source: None,
            }),
        }
    }

    /// Falls back to a random recent timeline item. `failure` carries the
    /// provider error that led here, if any.
    async fn replay(
        &self,
        backing: &Backing,
        failure: Option<String>,
    ) -> Result<ServedItem, ServingError> {
        match backing.timeline.random_recent(backing.fallback_pool).await {
            Ok(Some(item)) => return Ok(ServedItem::replayed(item)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "timeline unavailable for fallback"),
        }
        match failure {
            Some(debug) => Err(ServingError::Unreachable { debug: Some(debug) }),
            None => Err(ServingError::WarmingUp),
        }
    }

    fn spawn_timeline_append(&self, backing: &Backing, item: GeneratedItem) {
        let timeline = backing.timeline.clone();
        self.tracker.spawn(async move {
            if let Err(e) = timeline.append(&item).await {
                warn!(id = %item.id, error = %e, "failed to append served item");
            }
        });
    }
}
