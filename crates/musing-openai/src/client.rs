// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions APIs (Groq by default).
//!
//! Provides [`OpenAiClient`], which handles authentication, the request
//! timeout budget, and the mapping of HTTP outcomes onto [`ProviderError`].
//! It never retries: a 429 goes straight back to the caller.

use std::time::Duration;

use musing_core::{MusingError, ProviderError};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// `base_url` is the API root without the `/chat/completions` suffix.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, MusingError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| MusingError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MusingError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Sends a non-streaming completion request.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() {
                    "request timed out"
                } else {
                    "HTTP request failed"
                };
                ProviderError::unavailable(format!("{what}: {e}"), e)
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::unavailable("failed to read response body", e))?;
            return serde_json::from_str::<ChatResponse>(&body)
                .map_err(|e| ProviderError::unavailable("failed to parse API response", e));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!("API error ({status}): {}", api_err.error.message),
            Err(_) => format!("API returned {status}: {body}"),
        };

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(status = %status, "provider rate limited");
            return Err(ProviderError::RateLimited { message });
        }

        warn!(status = %status, "provider returned an error status");
        Err(ProviderError::Unavailable {
            message,
            source: None,
        })
    }
}
