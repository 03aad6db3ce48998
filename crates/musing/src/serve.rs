// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `musing serve` command implementation.
//!
//! Opens the configured store, builds the OpenAI-compatible provider and the
//! generation engine, and serves HTTP until SIGINT or SIGTERM. Background
//! generations are drained before exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use musing_config::model::MusingConfig;
use musing_core::{GenerationProvider, MusingError};
use musing_engine::{Engine, shutdown};
use musing_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use musing_openai::OpenAiProvider;
use tracing::{info, warn};

/// How long shutdown waits for in-flight generations.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// Runs the `musing serve` command.
pub async fn run_serve(config: MusingConfig) -> Result<(), MusingError> {
    init_tracing(&config.server.log_level);

    info!("starting musing serve");

    let store = musing_store::open_store(&config.store).await?;
    let provider: Arc<dyn GenerationProvider> = Arc::new(OpenAiProvider::new(&config)?);
    info!(
        model = config.provider.model.as_str(),
        base_url = config.provider.base_url.as_str(),
        "provider initialized"
    );

    let prometheus_render = init_metrics(&config)?;
    let engine = Engine::new(&config, provider, store);

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    if prometheus_render.is_some() {
        let mem_cancel = cancel.clone();
        tokio::spawn(async move {
            memory_monitor(mem_cancel).await;
        });
    }

    let state = GatewayState {
        engine: engine.clone(),
        debug_errors: config.server.debug_errors,
        health: HealthState {
            start_time: Instant::now(),
            prometheus_render,
        },
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let result = start_server(&server_config, state, cancel.clone()).await;
    // Also stops the monitor when the server exits on its own.
    cancel.cancel();

    if !engine.shutdown(DRAIN_TIMEOUT).await {
        warn!("some background generations did not finish before shutdown");
    }

    result?;
    info!("musing serve shutdown complete");
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics(config: &MusingConfig) -> Result<Option<MetricsRender>, MusingError> {
    if !config.metrics.enabled {
        info!("metrics disabled");
        return Ok(None);
    }
    let adapter = musing_prometheus::PrometheusAdapter::new()?;
    let handle = adapter.handle().clone();
    Ok(Some(Arc::new(move || handle.render())))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics(config: &MusingConfig) -> Result<Option<MetricsRender>, MusingError> {
    if config.metrics.enabled {
        warn!("metrics enabled in config but the binary was built without the `prometheus` feature");
    }
    Ok(None)
}

/// Background task exporting jemalloc heap stats as gauges every 15 seconds.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(cancel: tokio_util::sync::CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(15));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Stats are cached until the epoch advances.
                let _ = tikv_jemalloc_ctl::epoch::advance();
                let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
                let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);

                #[cfg(feature = "prometheus")]
                {
                    musing_prometheus::set_memory_heap(allocated as f64);
                    musing_prometheus::set_memory_resident(resident as f64);
                }
                tracing::trace!(allocated, resident, "memory stats");
            }
            _ = cancel.cancelled() => {
                info!("memory monitor shutting down");
                break;
            }
        }
    }
}

/// Stub memory monitor for MSVC (no jemalloc).
#[cfg(target_env = "msvc")]
async fn memory_monitor(cancel: tokio_util::sync::CancellationToken) {
    cancel.cancelled().await;
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("musing={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
