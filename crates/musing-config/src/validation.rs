// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, backend prerequisites, and value ranges.

use musing_core::types::MAX_CONTEXT_ITEMS;

use crate::diagnostic::ConfigError;
use crate::model::{MusingConfig, StoreBackend};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MusingConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    // Bind address must be an IP or a hostname-looking string.
    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        ));
    }

    if config.provider.base_url.trim().is_empty() {
        fail("provider.base_url must not be empty".to_string());
    }

    if !(0.0..=2.0).contains(&config.provider.temperature) {
        fail(format!(
            "provider.temperature must be within 0.0..=2.0, got {}",
            config.provider.temperature
        ));
    }

    if !(0.0..=2.0).contains(&config.provider.translation_temperature) {
        fail(format!(
            "provider.translation_temperature must be within 0.0..=2.0, got {}",
            config.provider.translation_temperature
        ));
    }

    if config.provider.max_tokens == 0 || config.provider.translation_max_tokens == 0 {
        fail("provider max token limits must be at least 1".to_string());
    }

    if config.provider.timeout_secs == 0 {
        fail("provider.timeout_secs must be at least 1".to_string());
    }

    match config.store.backend {
        StoreBackend::Redis => {
            let missing = config
                .store
                .redis_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty());
            if missing {
                fail("store.redis_url is required when store.backend = \"redis\"".to_string());
            }
        }
        StoreBackend::Sqlite => {
            if config.store.sqlite_path.trim().is_empty() {
                fail("store.sqlite_path must not be empty".to_string());
            }
        }
        StoreBackend::None | StoreBackend::Memory => {}
    }

    if config.store.item_ttl_secs == 0 {
        fail("store.item_ttl_secs must be at least 1".to_string());
    }

    let generation = &config.generation;
    if generation.low_water_mark == 0 {
        fail("generation.low_water_mark must be at least 1".to_string());
    }
    if generation.min_interval_secs == 0 {
        fail("generation.min_interval_secs must be at least 1".to_string());
    }
    if generation.timeline_cap == 0 {
        fail("generation.timeline_cap must be at least 1".to_string());
    }
    if generation.fallback_pool == 0 {
        fail("generation.fallback_pool must be at least 1".to_string());
    }
    if generation.context_items > MAX_CONTEXT_ITEMS {
        fail(format!(
            "generation.context_items must be at most {MAX_CONTEXT_ITEMS}, got {}",
            generation.context_items
        ));
    }
    if let Some(lang) = &generation.language {
        if lang.trim().is_empty() {
            fail("generation.language must not be empty when set".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
