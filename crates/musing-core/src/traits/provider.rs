// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation provider trait for LLM completion backends.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationContext;

/// Adapter for the external, rate-limited text generation service.
///
/// Implementations must not retry on their own: a `RateLimited` answer is
/// handed straight back so the caller can fall back to cached content.
#[async_trait]
pub trait GenerationProvider: PluginAdapter {
    /// Generates one item text for the given context.
    ///
    /// Returns `ProviderError::Malformed` when the response carries no content;
    /// callers substitute the placeholder text in that case.
    async fn generate(&self, context: &GenerationContext) -> Result<String, ProviderError>;

    /// Translates `text` into `target_lang`.
    ///
    /// An empty translation is returned as the source text.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError>;
}
