// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `musing check` command implementation.
//!
//! Runs quick diagnostic checks against the loaded configuration: store
//! reachability and provider credentials. Never calls the provider, since
//! that would spend rate-limit budget.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use musing_config::model::{MusingConfig, StoreBackend};
use musing_core::{HealthStatus, MusingError};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `musing check` command.
///
/// Returns an error when any check fails, so the exit code reflects it.
pub async fn run_check(config: &MusingConfig, plain: bool) -> Result<(), MusingError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config),
        check_store(config).await,
        check_provider_key(config),
    ];

    println!();
    println!("  musing check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(MusingError::Config(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<14} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<14} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_config(config: &MusingConfig) -> CheckResult {
    let start = Instant::now();
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!(
            "valid (listen {}:{}, model {})",
            config.server.host, config.server.port, config.provider.model
        ),
        start,
    )
}

async fn check_store(config: &MusingConfig) -> CheckResult {
    let start = Instant::now();
    let backend = config.store.backend;
    if backend == StoreBackend::None {
        return CheckResult::new(
            "Store",
            CheckStatus::Warn,
            "disabled, every request generates directly",
            start,
        );
    }

    let store = match musing_store::open_store(&config.store).await {
        Ok(Some(store)) => store,
        Ok(None) => {
            return CheckResult::new(
                "Store",
                CheckStatus::Warn,
                format!("{backend:?} unreachable, the server would run degraded"),
                start,
            );
        }
        Err(e) => return CheckResult::new("Store", CheckStatus::Fail, e.to_string(), start),
    };

    let result = match store.health_check().await {
        Ok(HealthStatus::Healthy) => {
            CheckResult::new("Store", CheckStatus::Pass, format!("{backend:?} healthy"), start)
        }
        Ok(HealthStatus::Degraded(reason)) => CheckResult::new(
            "Store",
            CheckStatus::Warn,
            format!("{backend:?} degraded: {reason}"),
            start,
        ),
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult::new(
            "Store",
            CheckStatus::Fail,
            format!("{backend:?} unhealthy: {reason}"),
            start,
        ),
        Err(e) => CheckResult::new("Store", CheckStatus::Fail, e.to_string(), start),
    };
    let _ = store.shutdown().await;
    result
}

fn check_provider_key(config: &MusingConfig) -> CheckResult {
    let start = Instant::now();
    match musing_openai::resolve_api_key(config.provider.api_key.as_deref()) {
        Ok(_) => CheckResult::new(
            "Provider",
            CheckStatus::Pass,
            format!("API key present ({})", config.provider.base_url),
            start,
        ),
        Err(e) => CheckResult::new("Provider", CheckStatus::Fail, e.to_string(), start),
    }
}
