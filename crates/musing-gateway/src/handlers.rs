// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles GET /generate, GET /history, POST /translate, GET|POST /visitors,
//! GET /health, GET /metrics.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use musing_core::{GeneratedItem, HealthStatus, ServingError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::server::GatewayState;

/// Page size when `limit` is absent or unparsable.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Largest page a single history request may ask for.
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Operator detail, only when `server.debug_errors` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            debug: None,
        }
    }
}

/// Raw query for GET /history. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl HistoryParams {
    /// Limit clamped to `0..=MAX_HISTORY_LIMIT`; unparsable falls back to the default.
    pub fn limit(&self) -> usize {
        parse_or(self.limit.as_deref(), DEFAULT_HISTORY_LIMIT).clamp(0, MAX_HISTORY_LIMIT) as usize
    }

    /// Offset clamped to non-negative; unparsable falls back to 0.
    pub fn offset(&self) -> usize {
        parse_or(self.offset.as_deref(), 0).max(0) as usize
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Response body for GET /history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<GeneratedItem>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for POST /translate.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "targetLang")]
    pub target_lang: Option<String>,
    #[serde(default, alias = "itemId")]
    pub item_id: Option<String>,
}

/// Response body for GET /visitors and POST /visitors.
#[derive(Debug, Serialize)]
pub struct VisitorsResponse {
    pub count: i64,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Worst of the provider and store statuses.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Store status, or `disabled` without a store.
    pub store: String,
    /// Provider status.
    pub provider: String,
    /// Items waiting in the generation queue. Omitted without a store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<usize>,
}

/// GET /generate
///
/// Serves one item through the fallback cascade.
pub async fn get_generate(State(state): State<GatewayState>) -> Response {
    let err = match state.engine.serve().await {
        Ok(served) => return (StatusCode::OK, Json(served)).into_response(),
        Err(err) => err,
    };
    let error = err.to_string();
    match err {
        ServingError::WarmingUp => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(error)),
        )
            .into_response(),
        ServingError::Unreachable { debug: detail } => {
            warn!(debug = detail.as_deref().unwrap_or(""), "generate failed");
            let body = ErrorResponse {
                error,
                debug: detail.filter(|_| state.debug_errors),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// GET /history?limit&offset
///
/// Returns a page of the timeline, newest first.
pub async fn get_history(
    State(state): State<GatewayState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let limit = params.limit();
    let offset = params.offset();

    match state.engine.history(offset, limit).await {
        Ok(Some(page)) => Json(HistoryResponse {
            items: page.items,
            total: page.total,
            limit: Some(limit),
            offset: Some(offset),
            message: None,
        })
        .into_response(),
        Ok(None) => Json(HistoryResponse {
            items: Vec::new(),
            total: 0,
            limit: None,
            offset: None,
            message: Some("storage not configured".to_string()),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to read history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("failed to fetch history")),
            )
                .into_response()
        }
    }
}

/// POST /translate
///
/// Translates item text into `target_lang`, caching per item when `item_id` is given.
pub async fn post_translate(
    State(state): State<GatewayState>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Response {
    let missing = || {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("missing text or target_lang")),
        )
            .into_response()
    };

    let Ok(Json(request)) = body else {
        return missing();
    };
    let (Some(text), Some(target_lang)) = (
        request.text.filter(|t| !t.trim().is_empty()),
        request.target_lang.filter(|l| !l.trim().is_empty()),
    ) else {
        return missing();
    };

    match state
        .engine
        .translate(&text, target_lang.trim(), request.item_id.as_deref())
        .await
    {
        Ok(translation) => {
            debug!(lang = %target_lang, cached = translation.cached, "translated");
            Json(translation).into_response()
        }
        Err(e) => {
            warn!(error = %e, lang = %target_lang, "translation failed");
            let body = ErrorResponse {
                error: "translation failed".to_string(),
                debug: Some(e.to_string()).filter(|_| state.debug_errors),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// GET /visitors
pub async fn get_visitors(State(state): State<GatewayState>) -> Json<VisitorsResponse> {
    Json(VisitorsResponse {
        count: state.engine.visitors().await,
    })
}

/// POST /visitors
///
/// Records one visit and returns the new count.
pub async fn post_visitors(State(state): State<GatewayState>) -> Json<VisitorsResponse> {
    Json(VisitorsResponse {
        count: state.engine.record_visit().await,
    })
}

/// GET /health
///
/// 200 unless an adapter reports unhealthy, then 503.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let health = state.engine.health().await;
    let status = health.status();
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        store: health
            .store
            .as_ref()
            .map_or("disabled", HealthStatus::as_str)
            .to_string(),
        provider: health.provider.as_str().to_string(),
        queue_depth: health.queue_depth,
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
///
/// Prometheus text exposition, or 404 when metrics are disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
