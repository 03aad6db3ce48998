// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One provider call turned into one [`GeneratedItem`].

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use musing_core::{
    Attributes, GeneratedItem, GenerationContext, GenerationProvider, ProviderError,
};
use tracing::{debug, warn};

/// Draws attributes, calls the provider, and wraps the text.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn GenerationProvider>,
    language: Option<String>,
}

impl Generator {
    pub fn new(provider: Arc<dyn GenerationProvider>, language: Option<String>) -> Self {
        Self { provider, language }
    }

    /// Generates one item. `recent` is prior item texts, newest first.
    ///
    /// Malformed provider output yields an item carrying the placeholder
    /// text; every other provider error is returned.
    pub async fn generate(&self, recent: Vec<String>) -> Result<GeneratedItem, ProviderError> {
        let attributes = Attributes::random(&mut rand::thread_rng());
        let context = GenerationContext::new(attributes)
            .with_recent(recent)
            .with_language(self.language.clone());

        let started = Instant::now();
        let result = self.provider.generate(&context).await;
        let elapsed = started.elapsed();

        #[cfg(feature = "prometheus")]
        {
            let outcome = result.as_ref().map_or_else(|e| e.kind(), |_| "ok");
            musing_prometheus::record_provider_call("generate", outcome);
            musing_prometheus::record_generation_latency(elapsed.as_secs_f64());
        }

        let text = match result {
            Ok(text) => text,
            Err(ProviderError::Malformed { message }) => {
                warn!(%message, "provider returned no usable content, using placeholder");
                String::new()
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "generation failed");
                return Err(e);
            }
        };

        let item = GeneratedItem::new(text, attributes, Utc::now(), self.language.clone());
        debug!(
            id = %item.id,
            flavor = %attributes.flavor,
            elapsed_ms = elapsed.as_millis() as u64,
            "item generated"
        );
        Ok(item)
    }
}
