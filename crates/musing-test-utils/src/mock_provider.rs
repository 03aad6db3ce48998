// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation provider for deterministic testing.
//!
//! `MockProvider` implements `GenerationProvider` with a scripted reply
//! queue, optional latency, and capture of every context it was called with.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use musing_core::traits::adapter::PluginAdapter;
use musing_core::traits::provider::GenerationProvider;
use musing_core::types::{AdapterType, GenerationContext, HealthStatus};
use musing_core::{MusingError, ProviderError};

/// One scripted provider outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    RateLimited,
    Unavailable,
    Malformed,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn into_result(self) -> Result<String, ProviderError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::RateLimited => Err(ProviderError::RateLimited {
                message: "mock 429".into(),
            }),
            MockReply::Unavailable => Err(ProviderError::Unavailable {
                message: "mock outage".into(),
                source: None,
            }),
            MockReply::Malformed => Err(ProviderError::Malformed {
                message: "mock empty content".into(),
            }),
        }
    }
}

/// A mock generation provider that returns scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty the
/// fallback reply is returned (`"mock musing"` unless overridden).
/// Cloning shares the script and the capture buffers.
#[derive(Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: Arc<Mutex<MockReply>>,
    latency: Option<Duration>,
    generate_calls: Arc<AtomicUsize>,
    translate_calls: Arc<AtomicUsize>,
    contexts: Arc<Mutex<Vec<GenerationContext>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(MockReply::text("mock musing"))),
            latency: None,
            generate_calls: Arc::new(AtomicUsize::new(0)),
            translate_calls: Arc::new(AtomicUsize::new(0)),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        let provider = Self::new();
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..provider
        }
    }

    /// Sleep for `latency` before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Replace the reply used once the queue is empty.
    pub async fn set_fallback(&self, reply: MockReply) {
        *self.fallback.lock().await = reply;
    }

    /// Number of `generate` invocations so far.
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Number of `translate` invocations so far.
    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    /// Every context passed to `generate`, in call order.
    pub async fn contexts(&self) -> Vec<GenerationContext> {
        self.contexts.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let scripted = self.replies.lock().await.pop_front();
        match scripted {
            Some(reply) => reply,
            None => self.fallback.lock().await.clone(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(&self, context: &GenerationContext) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().await.push(context.clone());
        self.next_reply().await.into_result()
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply().await.into_result()? {
            translated if translated.trim().is_empty() => Ok(text.to_string()),
            translated => Ok(format!("[{target_lang}] {translated}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musing_core::types::{Attributes, Flavor, Tone};

    fn ctx() -> GenerationContext {
        GenerationContext::new(Attributes {
            flavor: Flavor::EurekaExtract,
            tone: Tone::Electric,
            intensity: 91,
        })
    }

    #[tokio::test]
    async fn fallback_reply_when_queue_empty() {
        let provider = MockProvider::new();
        assert_eq!(provider.generate(&ctx()).await.unwrap(), "mock musing");
        assert_eq!(provider.generate_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_replies_in_order() {
        let provider = MockProvider::with_replies(vec![
            MockReply::text("first"),
            MockReply::RateLimited,
            MockReply::Unavailable,
            MockReply::Malformed,
        ]);

        assert_eq!(provider.generate(&ctx()).await.unwrap(), "first");
        assert!(matches!(
            provider.generate(&ctx()).await,
            Err(ProviderError::RateLimited { .. })
        ));
        assert!(matches!(
            provider.generate(&ctx()).await,
            Err(ProviderError::Unavailable { .. })
        ));
        assert!(matches!(
            provider.generate(&ctx()).await,
            Err(ProviderError::Malformed { .. })
        ));
        assert_eq!(provider.generate(&ctx()).await.unwrap(), "mock musing");
        assert_eq!(provider.generate_calls(), 5);
    }

    #[tokio::test]
    async fn captures_contexts() {
        let provider = MockProvider::new();
        let context = ctx().with_recent(vec!["earlier".into()]);
        provider.generate(&context).await.unwrap();
        let seen = provider.contexts().await;
        assert_eq!(seen, vec![context]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let provider = MockProvider::new();
        let clone = provider.clone();
        clone.push_reply(MockReply::text("shared")).await;
        assert_eq!(provider.generate(&ctx()).await.unwrap(), "shared");
        assert_eq!(clone.generate_calls(), 1);
    }

    #[tokio::test]
    async fn translate_tags_language() {
        let provider = MockProvider::with_replies(vec![MockReply::text("hola")]);
        assert_eq!(provider.translate("hello", "es").await.unwrap(), "[es] hola");
        assert_eq!(provider.translate_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_reply() {
        let provider = MockProvider::new().with_latency(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        provider.generate(&ctx()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
