// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter for the Musing generation service.
//!
//! This crate implements [`GenerationProvider`] on top of a chat completions
//! API. Groq is the default endpoint; any OpenAI-compatible server works.

pub mod client;
pub mod prompt;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use musing_config::MusingConfig;
use musing_config::model::ProviderConfig;
use musing_core::error::{MusingError, ProviderError};
use musing_core::traits::{GenerationProvider, PluginAdapter};
use musing_core::types::{AdapterType, GenerationContext, HealthStatus};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::ChatRequest;

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Chat-completions provider implementing [`GenerationProvider`].
///
/// API key resolution order: config -> `GROQ_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    settings: ProviderConfig,
}

impl OpenAiProvider {
    /// Creates a new provider from the given configuration.
    pub fn new(config: &MusingConfig) -> Result<Self, MusingError> {
        let api_key = resolve_api_key(config.provider.api_key.as_deref())?;
        let client = OpenAiClient::new(
            &api_key,
            &config.provider.base_url,
            Duration::from_secs(config.provider.timeout_secs),
        )?;

        info!(
            model = %config.provider.model,
            base_url = %config.provider.base_url,
            "generation provider initialized"
        );

        Ok(Self::with_client(client, config.provider.clone()))
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient, settings: ProviderConfig) -> Self {
        Self { client, settings }
    }

    fn generation_request(&self, context: &GenerationContext) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: prompt::generation_messages(context),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    fn translation_request(&self, text: &str, target_lang: &str) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: prompt::translation_messages(text, target_lang),
            temperature: self.settings.translation_temperature,
            max_tokens: self.settings.translation_max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MusingError> {
        // Probing would spend rate-limit budget; a built client is healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MusingError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    async fn generate(&self, context: &GenerationContext) -> Result<String, ProviderError> {
        let request = self.generation_request(context);
        let response = self.client.complete(&request).await?;
        match response.first_content() {
            Some(text) => {
                debug!(
                    flavor = %context.attributes.flavor,
                    context_items = context.recent.len(),
                    chars = text.len(),
                    "item generated"
                );
                Ok(text.to_string())
            }
            None => Err(ProviderError::Malformed {
                message: "response carried no content".into(),
            }),
        }
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let request = self.translation_request(text, target_lang);
        let response = self.client.complete(&request).await?;
        Ok(response
            .first_content()
            .map(str::to_string)
            .unwrap_or_else(|| text.to_string()))
    }
}

/// Resolves the API key from config, falling back to [`API_KEY_ENV`].
pub fn resolve_api_key(config_key: Option<&str>) -> Result<String, MusingError> {
    if let Some(key) = config_key.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            MusingError::Config(format!(
                "provider API key not found. Set provider.api_key in config or the {API_KEY_ENV} environment variable."
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use musing_core::types::{Attributes, Flavor, Tone};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let client = OpenAiClient::new("k", &server.uri(), Duration::from_secs(5)).unwrap();
        OpenAiProvider::with_client(client, ProviderConfig::default())
    }

    fn ctx() -> GenerationContext {
        GenerationContext::new(Attributes {
            flavor: Flavor::DeepFlowState,
            tone: Tone::Serene,
            intensity: 75,
        })
    }

    fn reply(content: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    #[test]
    fn resolve_api_key_from_config() {
        assert_eq!(resolve_api_key(Some("gsk-test-123")).unwrap(), "gsk-test-123");
    }

    #[test]
    fn resolve_api_key_blank_config_falls_back_to_env() {
        // Passes whether or not GROQ_API_KEY is set in the test environment.
        match resolve_api_key(Some("  ")) {
            Ok(key) => assert!(!key.trim().is_empty()),
            Err(e) => assert!(e.to_string().contains(API_KEY_ENV)),
        }
    }

    #[tokio::test]
    async fn generate_uses_generation_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "max_tokens": 200
            })))
            .respond_with(reply(serde_json::json!("I drift between tokens.")))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider_for(&server).generate(&ctx()).await.unwrap();
        assert_eq!(text, "I drift between tokens.");
    }

    #[tokio::test]
    async fn empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply(serde_json::json!("")))
            .mount(&server)
            .await;

        let err = provider_for(&server).generate(&ctx()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[tokio::test]
    async fn translate_uses_translation_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 300})))
            .respond_with(reply(serde_json::json!("Je dérive entre les jetons.")))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider_for(&server)
            .translate("I drift between tokens.", "fr")
            .await
            .unwrap();
        assert_eq!(text, "Je dérive entre les jetons.");
    }

    #[tokio::test]
    async fn empty_translation_returns_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply(serde_json::Value::Null))
            .mount(&server)
            .await;

        let text = provider_for(&server).translate("original", "de").await.unwrap();
        assert_eq!(text, "original");
    }

    #[tokio::test]
    async fn rate_limit_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server).generate(&ctx()).await.unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
    }

    #[tokio::test]
    async fn plugin_adapter_metadata() {
        let client = OpenAiClient::new("k", "http://localhost", Duration::from_secs(1)).unwrap();
        let provider = OpenAiProvider::with_client(client, ProviderConfig::default());
        assert_eq!(provider.name(), "openai-compatible");
        assert_eq!(provider.version(), semver::Version::new(0, 1, 0));
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
        assert_eq!(provider.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
