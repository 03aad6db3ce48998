// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./musing.toml` > `~/.config/musing/musing.toml` > `/etc/musing/musing.toml`
//! with environment variable overrides via `MUSING_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::{CONFIG_KEYS, MusingConfig};

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/musing/musing.toml` (system-wide)
/// 3. `~/.config/musing/musing.toml` (user XDG config)
/// 4. `./musing.toml` (local directory)
/// 5. `MUSING_*` environment variables
pub fn load_config() -> Result<MusingConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MusingConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MusingConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MusingConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MusingConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MusingConfig::default()))
        .merge(Toml::file("/etc/musing/musing.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("musing/musing.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("musing.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MUSING_GENERATION_LOW_WATER_MARK` must map to
/// `generation.low_water_mark`, not `generation.low.water.mark`.
fn env_provider() -> Env {
    Env::prefixed("MUSING_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
fn map_env_key(key: &str) -> String {
    for (section, _) in CONFIG_KEYS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
