// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Musing configuration system.

use musing_config::diagnostic::{ConfigError, closest};
use musing_config::model::{MusingConfig, StoreBackend};
use musing_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_musing_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"
debug_errors = true

[provider]
api_key = "gsk-123"
base_url = "http://localhost:9999/v1"
model = "tiny-model"
temperature = 0.5
max_tokens = 64
timeout_secs = 5

[store]
backend = "redis"
redis_url = "redis://127.0.0.1:6379/0"
key_prefix = "musing-test"

[generation]
low_water_mark = 5
min_interval_secs = 10
limiter_grace_secs = 2
timeline_cap = 50
fallback_pool = 7
context_items = 3
language = "fr"

[metrics]
enabled = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert!(config.server.debug_errors);
    assert_eq!(config.provider.api_key.as_deref(), Some("gsk-123"));
    assert_eq!(config.provider.model, "tiny-model");
    assert_eq!(config.provider.max_tokens, 64);
    assert_eq!(config.store.backend, StoreBackend::Redis);
    assert_eq!(
        config.store.redis_url.as_deref(),
        Some("redis://127.0.0.1:6379/0")
    );
    assert_eq!(config.store.key_prefix, "musing-test");
    assert_eq!(config.generation.low_water_mark, 5);
    assert_eq!(config.generation.min_interval_secs, 10);
    assert_eq!(config.generation.timeline_cap, 50);
    assert_eq!(config.generation.fallback_pool, 7);
    assert_eq!(config.generation.language.as_deref(), Some("fr"));
    assert!(!config.metrics.enabled);
}

/// Unknown field in [server] section produces an error naming the key.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
prot = 3000
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_produces_error() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;

    assert!(load_config_from_str(toml).is_err());

    let errors = load_and_validate_str("[metric]\nenabled = false\n").expect_err("typo section");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownSection {
            section, suggestion, ..
        } if section == "metric" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("metrics"));
}

/// A key valid in another section points there.
#[test]
fn misplaced_key_points_at_its_section() {
    let toml = r#"
[server]
redis_url = "redis://localhost"
"#;

    let errors = load_and_validate_str(toml).expect_err("redis_url is a store key");
    let home = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, home_section, ..
        } if key == "redis_url" => home_section.clone(),
        _ => None,
    });
    assert_eq!(home.as_deref(), Some("store"));
}

/// Unknown keys become `UnknownKey` diagnostics with a suggestion.
#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let toml = r#"
[generation]
low_watermark = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "low_watermark" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("low_water_mark"));
}

/// Wrong value type is reported as an invalid type.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("string port should fail");
    let (key, span) = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::InvalidValue { key, span, .. } => Some((key.clone(), *span)),
            _ => None,
        })
        .expect("should be an invalid value");
    assert_eq!(key, "server.port");
    let span = span.expect("inline source should carry a span");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "port");
}

/// An unknown store backend name is rejected at deserialization.
#[test]
fn unknown_backend_is_rejected() {
    let toml = r#"
[store]
backend = "memcached"
"#;

    assert!(load_config_from_str(toml).is_err());

    let errors = load_and_validate_str("[store]\nbackend = \"sqlit\"\n").expect_err("typo backend");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::InvalidValue { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("sqlite"));
}

/// Dotted overrides land on underscore-named keys.
#[test]
fn dotted_override_sets_underscore_key() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: MusingConfig = Figment::new()
        .merge(Serialized::defaults(MusingConfig::default()))
        .merge(Toml::string("[generation]\nmin_interval_secs = 30\n"))
        .merge(("generation.min_interval_secs", 12))
        .merge(("store.redis_url", "redis://cache:6379"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.generation.min_interval_secs, 12);
    assert_eq!(config.store.redis_url.as_deref(), Some("redis://cache:6379"));
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: MusingConfig = Figment::new()
        .merge(Serialized::defaults(MusingConfig::default()))
        .merge(Toml::file("/nonexistent/path/musing.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.store.backend, StoreBackend::Memory);
}

/// A config file on disk is picked up by path.
#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("musing.toml");
    std::fs::write(
        &path,
        "[store]\nbackend = \"sqlite\"\nsqlite_path = \"/tmp/x.db\"\n",
    )
    .unwrap();

    let config = load_config_from_path(&path).expect("file config should load");
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.sqlite_path, "/tmp/x.db");
}

/// Validation errors are collected, not fail-fast.
#[test]
fn validation_collects_all_errors() {
    let toml = r#"
[store]
backend = "redis"

[generation]
timeline_cap = 0
fallback_pool = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 3, "got: {errors:?}");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Empty config validates with defaults.
#[test]
fn empty_config_validates() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.generation.low_water_mark, 3);
    assert_eq!(config.generation.min_interval_secs, 45);
    assert!(config.provider.api_key.is_none());
}

/// Fuzzy suggestions work against real section keys.
#[test]
fn closest_against_store_keys() {
    let valid = ["backend", "redis_url", "sqlite_path", "key_prefix"];
    assert_eq!(closest("redis_ulr", valid), Some("redis_url".to_string()));
    assert_eq!(closest("qqqq", valid), None);
}

/// ConfigError renders through miette with code and help.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        section: "server".to_string(),
        key: "prot".to_string(),
        suggestion: Some("port".to_string()),
        home_section: None,
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("should have help").to_string();
    assert!(help.contains("did you mean `port`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("prot"));
}
