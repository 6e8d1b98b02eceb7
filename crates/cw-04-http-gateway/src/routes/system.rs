//! Liveness, build info and metrics.

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::router::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": state.config.http.service_name,
        "time": state.now(),
    }))
}

/// `GET /version`
pub async fn version(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "version": crate::VERSION,
        "commit": state.config.http.commit,
    }))
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics() -> ApiResult<impl IntoResponse> {
    let body = cw_telemetry::encode_metrics().map_err(|e| {
        tracing::error!(error = %e, "metrics encoding failed");
        ApiError::misconfigured(codes::INTERNAL_ERROR)
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
