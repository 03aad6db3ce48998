// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Musing generation service.
//!
//! The request path deals in three small taxonomies: [`ProviderError`] for the
//! generation provider, [`StoreError`] for the key-value store, and
//! [`ServingError`] for what a caller of the fallback cascade finally sees.
//! [`MusingError`] covers startup and wiring failures.

use thiserror::Error;

/// Failure reported by a generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider signaled throttling (HTTP 429). Never retried.
    #[error("provider rate limited: {message}")]
    RateLimited { message: String },

    /// Transport failure, timeout, or a non-success status other than 429.
    #[error("provider unavailable: {message}")]
    Unavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response parsed but carried no usable content.
    #[error("provider returned malformed content: {message}")]
    Malformed { message: String },
}

impl ProviderError {
    /// Builds an `Unavailable` error wrapping an underlying cause.
    pub fn unavailable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Unavailable { .. } => "unavailable",
            Self::Malformed { .. } => "malformed",
        }
    }
}

/// Failure reported by a key-value store backend.
///
/// Callers never propagate these to users; they log and degrade.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("store unreachable: {message}")]
    Unreachable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value could not be encoded or decoded.
    #[error("store codec error: {0}")]
    Codec(String),
}

impl StoreError {
    /// Builds an `Unreachable` error wrapping an underlying cause.
    pub fn unreachable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unreachable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Outcome of the fallback cascade when no item could be served.
#[derive(Debug, Error)]
pub enum ServingError {
    /// The provider failed and there was no fallback content.
    #[error("the generator is momentarily unreachable")]
    Unreachable {
        /// Operator-facing detail. Never the sole signal of failure.
        debug: Option<String>,
    },

    /// Nothing generated yet and generation is not currently permitted.
    #[error("warming up, try again shortly")]
    WarmingUp,
}

/// The primary error type for startup, configuration, and wiring.
#[derive(Debug, Error)]
pub enum MusingError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors during initialization or maintenance.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Provider construction or invocation errors outside the cascade.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// HTTP server errors (bind failure, serve loop failure).
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for MusingError {
    fn from(err: StoreError) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}

impl From<ProviderError> for MusingError {
    fn from(err: ProviderError) -> Self {
        Self::Provider {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
