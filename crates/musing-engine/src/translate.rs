// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Item translation with a per-item, per-language cache.

use std::sync::Arc;
use std::time::Duration;

use musing_core::{GenerationProvider, KeyValueStore, ProviderError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::keys::Keys;

/// Language code whose translations are the input itself.
pub const SOURCE_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub translation: String,
    pub cached: bool,
}

#[derive(Clone)]
pub struct Translator {
    provider: Arc<dyn GenerationProvider>,
    store: Option<Arc<dyn KeyValueStore>>,
    keys: Keys,
    ttl: Duration,
}

impl Translator {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Option<Arc<dyn KeyValueStore>>,
        keys: Keys,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            keys,
            ttl,
        }
    }

    /// Translates `text` into `target_lang`.
    ///
    /// With an `item_id` and a store, a cached translation is returned
    /// before anything else and fresh translations are cached. English is
    /// returned unchanged without calling the provider.
    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        item_id: Option<&str>,
    ) -> Result<Translation, ProviderError> {
        let cache_key = match (&self.store, item_id) {
            (Some(_), Some(id)) if !id.is_empty() => Some(self.keys.translation(id, target_lang)),
            _ => None,
        };

        if let (Some(store), Some(key)) = (&self.store, &cache_key) {
            match store.get(key).await {
                Ok(Some(translation)) if !translation.is_empty() => {
                    debug!(%key, "translation cache hit");
                    return Ok(Translation {
                        translation,
                        cached: true,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!(%key, error = %e, "translation cache read failed"),
            }
        }

        if target_lang == SOURCE_LANGUAGE {
            return Ok(Translation {
                translation: text.to_string(),
                cached: false,
            });
        }

        let result = self.provider.translate(text, target_lang).await;
        #[cfg(feature = "prometheus")]
        musing_prometheus::record_provider_call(
            "translate",
            result.as_ref().map_or_else(|e| e.kind(), |_| "ok"),
        );
        let translation = result?;

        if let (Some(store), Some(key)) = (&self.store, &cache_key) {
            if let Err(e) = store.set(key, &translation, Some(self.ttl)).await {
                warn!(%key, error = %e, "translation cache write failed");
            }
        }

        Ok(Translation {
            translation,
            cached: false,
        })
    }
}
