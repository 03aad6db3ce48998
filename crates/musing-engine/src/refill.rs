// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background top-up of the generation queue.
//!
//! [`RefillScheduler::schedule_refill`] claims the rate-limit window on the
//! caller's path, then runs the refill as a detached task on a
//! [`TaskTracker`]. [`RefillScheduler::top_up`] moves even the queue-size
//! check and the claim onto the tracker, so a request serving a queued item
//! never waits on them. Nobody awaits a refill's result; failures are logged
//! inside the task. The tracker exists only so shutdown can drain in-flight
//! refills.

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::generator::Generator;
use crate::queue::ItemQueue;
use crate::rate_limit::RateLimiter;
use crate::timeline::Timeline;

#[derive(Clone)]
pub struct RefillScheduler {
    queue: ItemQueue,
    timeline: Timeline,
    limiter: RateLimiter,
    generator: Generator,
    tracker: TaskTracker,
    low_water_mark: usize,
    context_items: usize,
}

impl RefillScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: ItemQueue,
        timeline: Timeline,
        limiter: RateLimiter,
        generator: Generator,
        tracker: TaskTracker,
        low_water_mark: usize,
        context_items: usize,
    ) -> Self {
        Self {
            queue,
            timeline,
            limiter,
            generator,
            tracker,
            low_water_mark,
            context_items,
        }
    }

    /// Runs [`maybe_refill`](Self::maybe_refill) on the tracker and returns
    /// at once.
    pub fn top_up(&self) {
        let this = self.clone();
        self.tracker.spawn(async move {
            this.maybe_refill().await;
        });
    }

    /// Schedules a refill when the queue is below the low-water mark and the
    /// limiter grants the window. Returns whether one was scheduled.
    pub async fn maybe_refill(&self) -> bool {
        let size = match self.queue.size().await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "queue size unavailable, skipping refill");
                return false;
            }
        };
        #[cfg(feature = "prometheus")]
        musing_prometheus::set_queue_depth(size as f64);
        if size >= self.low_water_mark {
            return false;
        }
        self.schedule_refill().await
    }

    /// Claims the rate-limit window and spawns the refill task.
    pub async fn schedule_refill(&self) -> bool {
        if !self.limiter.try_claim().await {
            debug!("refill skipped, rate limit window taken");
            return false;
        }
        let this = self.clone();
        self.tracker.spawn(async move { this.refill_once().await });
        true
    }

    async fn refill_once(&self) {
        let recent = match self.timeline.recent_texts(self.context_items).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(error = %e, "refill: context unavailable, generating without it");
                Vec::new()
            }
        };

        let item = match self.generator.generate(recent).await {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "refill: generation failed");
                #[cfg(feature = "prometheus")]
                musing_prometheus::record_refill("failed");
                return;
            }
        };

        match self.queue.push(&item).await {
            Ok(size) => {
                info!(id = %item.id, queue_size = size, "refill: item queued");
                #[cfg(feature = "prometheus")]
                musing_prometheus::set_queue_depth(size as f64);
            }
            Err(e) => warn!(id = %item.id, error = %e, "refill: failed to queue item"),
        }
        if let Err(e) = self.timeline.append(&item).await {
            warn!(id = %item.id, error = %e, "refill: failed to append to timeline");
        }

        #[cfg(feature = "prometheus")]
        musing_prometheus::record_refill("queued");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::keys::Keys;
    use musing_core::{Attributes, Flavor, GeneratedItem, KeyValueStore, Tone};
    use musing_store::MemoryStore;
    use musing_test_utils::{FailingStore, MockProvider, MockReply};

    fn scheduler(store: Arc<dyn KeyValueStore>, provider: MockProvider) -> RefillScheduler {
        let keys = Keys::new("musing");
        RefillScheduler::new(
            ItemQueue::new(store.clone(), keys.queue()),
            Timeline::new(store.clone(), keys.clone(), 100, Duration::from_secs(3600)),
            RateLimiter::new(
                store,
                keys.rate_limit(),
                Duration::from_secs(45),
                Duration::from_secs(15),
            ),
            Generator::new(Arc::new(provider), None),
            TaskTracker::new(),
            3,
            5,
        )
    }

    fn item(text: &str) -> GeneratedItem {
        GeneratedItem::new(
            text,
            Attributes {
                flavor: Flavor::ZenClarity,
                tone: Tone::Serene,
                intensity: 80,
            },
            chrono::Utc::now(),
            None,
        )
    }

    async fn drain(s: &RefillScheduler) {
        s.tracker.close();
        s.tracker.wait().await;
    }

    #[tokio::test]
    async fn refill_pushes_to_queue_and_timeline() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::with_replies(vec![MockReply::text("refilled")]);
        let s = scheduler(store.clone(), provider.clone());

        assert!(s.maybe_refill().await);
        drain(&s).await;

        assert_eq!(provider.generate_calls(), 1);
        assert_eq!(s.queue.size().await.unwrap(), 1);
        assert_eq!(s.timeline.total().await.unwrap(), 1);
        assert_eq!(s.queue.try_pop().await.unwrap().unwrap().text, "refilled");
    }

    #[tokio::test]
    async fn at_or_above_mark_does_nothing() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::new();
        let s = scheduler(store, provider.clone());
        for text in ["one", "two", "three"] {
            s.queue.push(&item(text)).await.unwrap();
        }
        assert!(!s.maybe_refill().await);
        drain(&s).await;
        assert_eq!(provider.generate_calls(), 0);
    }

    #[tokio::test]
    async fn top_up_returns_before_touching_the_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::new();
        let s = scheduler(store.clone(), provider.clone());

        s.top_up();
        // Nothing has run yet on this single-threaded runtime.
        assert!(store.get("musing:ratelimit:last_generation").await.unwrap().is_none());

        drain(&s).await;
        assert_eq!(provider.generate_calls(), 1);
        assert_eq!(s.queue.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreadable_queue_skips_refill() {
        let provider = MockProvider::new();
        let s = scheduler(Arc::new(FailingStore::new()), provider.clone());
        assert!(!s.maybe_refill().await);
        drain(&s).await;
        assert_eq!(provider.generate_calls(), 0);
    }

    #[tokio::test]
    async fn second_refill_in_window_is_denied() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::new();
        let s = scheduler(store, provider.clone());
        assert!(s.schedule_refill().await);
        assert!(!s.schedule_refill().await);
        drain(&s).await;
        assert_eq!(provider.generate_calls(), 1);
    }

    #[tokio::test]
    async fn provider_failure_is_swallowed() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::with_replies(vec![MockReply::Unavailable]);
        let s = scheduler(store, provider);
        assert!(s.schedule_refill().await);
        drain(&s).await;
        assert_eq!(s.queue.size().await.unwrap(), 0);
        assert_eq!(s.timeline.total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn refill_passes_timeline_context() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let provider = MockProvider::new();
        let s = scheduler(store, provider.clone());
        s.timeline.append(&item("earlier thought")).await.unwrap();
        s.schedule_refill().await;
        drain(&s).await;
        let contexts = provider.contexts().await;
        assert_eq!(contexts[0].recent, vec!["earlier thought".to_string()]);
    }
}
