// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Musing generation service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Every `[section]` of `musing.toml` with the keys it accepts.
///
/// Kept in sync with the structs below; a test serializes a fully populated
/// config and compares.
pub const CONFIG_KEYS: &[(&str, &[&str])] = &[
    ("server", &["host", "port", "log_level", "debug_errors"]),
    (
        "provider",
        &[
            "api_key",
            "base_url",
            "model",
            "temperature",
            "max_tokens",
            "translation_temperature",
            "translation_max_tokens",
            "timeout_secs",
        ],
    ),
    (
        "store",
        &["backend", "redis_url", "sqlite_path", "key_prefix", "item_ttl_secs"],
    ),
    (
        "generation",
        &[
            "low_water_mark",
            "min_interval_secs",
            "limiter_grace_secs",
            "timeline_cap",
            "fallback_pool",
            "context_items",
            "language",
            "translation_ttl_secs",
        ],
    ),
    ("metrics", &["enabled"]),
];

/// Keys accepted by `section`, or `None` for an unknown section.
pub fn section_keys(section: &str) -> Option<&'static [&'static str]> {
    CONFIG_KEYS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// Top-level Musing configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MusingConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Generation provider (OpenAI-compatible API) settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Key-value store backend settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Queue, rate limit, and timeline tuning.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Attach a `debug` detail to 500 responses.
    #[serde(default)]
    pub debug_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            debug_errors: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Generation provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. `None` falls back to the `GROQ_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for item generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens for item generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for translations.
    #[serde(default = "default_translation_temperature")]
    pub translation_temperature: f32,

    /// Maximum output tokens for translations.
    #[serde(default = "default_translation_max_tokens")]
    pub translation_max_tokens: u32,

    /// Per-request timeout budget in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            translation_temperature: default_translation_temperature(),
            translation_max_tokens: default_translation_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("translation_temperature", &self.translation_temperature)
            .field("translation_max_tokens", &self.translation_max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    200
}

fn default_translation_temperature() -> f32 {
    0.3
}

fn default_translation_max_tokens() -> u32 {
    300
}

fn default_timeout_secs() -> u64 {
    30
}

/// Which key-value store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// No store: every request generates directly.
    None,
    /// Process-local store. State is lost on restart.
    Memory,
    /// Single-node persistent store in a SQLite file.
    Sqlite,
    /// Shared Redis server.
    Redis,
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Redis connection URL, required when `backend = "redis"`.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Path to the SQLite database file.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Prefix prepended to every key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Expiry of stored item payloads in seconds.
    #[serde(default = "default_item_ttl_secs")]
    pub item_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            redis_url: None,
            sqlite_path: default_sqlite_path(),
            key_prefix: default_key_prefix(),
            item_ttl_secs: default_item_ttl_secs(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_sqlite_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("musing").join("musing.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("musing.db"))
        .to_string_lossy()
        .to_string()
}

fn default_key_prefix() -> String {
    "musing".to_string()
}

fn default_item_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

/// Queue, rate limit, and timeline tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Queue size below which a background refill is triggered.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Minimum seconds between provider invocations.
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,

    /// Extra seconds the rate-limit marker outlives the interval.
    #[serde(default = "default_limiter_grace_secs")]
    pub limiter_grace_secs: u64,

    /// Maximum number of items indexed by the timeline.
    #[serde(default = "default_timeline_cap")]
    pub timeline_cap: usize,

    /// Number of newest timeline items a cached fallback picks from.
    #[serde(default = "default_fallback_pool")]
    pub fallback_pool: usize,

    /// Number of recent item texts passed to the provider (at most 5).
    #[serde(default = "default_context_items")]
    pub context_items: usize,

    /// Output language for generated items. `None` leaves it to the model.
    #[serde(default)]
    pub language: Option<String>,

    /// Expiry of cached translations in seconds.
    #[serde(default = "default_translation_ttl_secs")]
    pub translation_ttl_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            low_water_mark: default_low_water_mark(),
            min_interval_secs: default_min_interval_secs(),
            limiter_grace_secs: default_limiter_grace_secs(),
            timeline_cap: default_timeline_cap(),
            fallback_pool: default_fallback_pool(),
            context_items: default_context_items(),
            language: None,
            translation_ttl_secs: default_translation_ttl_secs(),
        }
    }
}

fn default_low_water_mark() -> usize {
    3
}

fn default_min_interval_secs() -> u64 {
    45
}

fn default_limiter_grace_secs() -> u64 {
    15
}

fn default_timeline_cap() -> usize {
    1000
}

fn default_fallback_pool() -> usize {
    20
}

fn default_context_items() -> usize {
    5
}

fn default_translation_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MusingConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.provider.model, "llama-3.3-70b-versatile");
        assert_eq!(config.provider.max_tokens, 200);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.generation.low_water_mark, 3);
        assert_eq!(config.generation.min_interval_secs, 45);
        assert_eq!(config.generation.timeline_cap, 1000);
        assert_eq!(config.generation.fallback_pool, 20);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn provider_debug_redacts_api_key() {
        let config = ProviderConfig {
            api_key: Some("gsk_supersecret".into()),
            ..ProviderConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn key_table_matches_serialized_config() {
        let mut config = MusingConfig::default();
        config.provider.api_key = Some("k".into());
        config.store.redis_url = Some("redis://localhost".into());
        config.generation.language = Some("fr".into());

        let value = toml::Value::try_from(&config).unwrap();
        let tables = value.as_table().unwrap();
        assert_eq!(tables.len(), CONFIG_KEYS.len());

        for (section, keys) in CONFIG_KEYS {
            let table = tables[*section].as_table().unwrap();
            let mut actual: Vec<&str> = table.keys().map(String::as_str).collect();
            let mut expected = keys.to_vec();
            actual.sort_unstable();
            expected.sort_unstable();
            assert_eq!(actual, expected, "[{section}] drifted from CONFIG_KEYS");
        }
    }

    #[test]
    fn section_keys_lookup() {
        assert!(section_keys("store").unwrap().contains(&"redis_url"));
        assert!(section_keys("telegram").is_none());
    }

    #[test]
    fn backend_deserializes_lowercase() {
        let config: MusingConfig = toml::from_str("[store]\nbackend = \"redis\"\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Redis);
    }
}
