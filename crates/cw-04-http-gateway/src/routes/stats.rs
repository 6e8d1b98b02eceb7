//! `POST /stats`

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::domain::payload::FieldReader;
use crate::domain::requests::{signing_bytes, within_skew, StatsRequest};
use crate::middleware::{ClientIp, ScopedLimit};
use crate::router::AppState;
use crate::routes::outcome;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use cw_telemetry::{metric_inc, STATS_SUBMISSIONS};
use serde_json::{json, Value};
use shared_crypto::verify_detached;
use tracing::debug;

pub async fn submit_stats(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let result = admit(&state, &ip, &body).await;
    metric_inc!(STATS_SUBMISSIONS, &[outcome(&result)]);
    result?;
    Ok(Json(json!({ "ok": true })))
}

async fn admit(state: &AppState, ip: &str, body: &[u8]) -> ApiResult<()> {
    let trust = &state.config.trust;
    let keys = &state.trust.stats;
    if trust.require_stats_keys && keys.is_empty() {
        return Err(ApiError::misconfigured(codes::MISSING_STATS_KEYS));
    }

    let admission = &state.config.admission;
    state
        .limiter
        .check_all(&[ScopedLimit::new(
            "stats_ip",
            ip,
            admission.stats_ip,
            codes::RATE_LIMITED,
        )])
        .await?;

    let reader = FieldReader::parse(body)?;
    let request = StatsRequest::read(&reader)?;

    let now = state.now();
    if !within_skew(now, request.last_block_time, admission.block_time_skew_secs()) {
        return Err(ApiError::timestamp_skew());
    }

    if !keys.admits(&request.public_key, trust.require_stats_keys) {
        return Err(ApiError::untrusted_key());
    }

    let message = signing_bytes(&request.signed())?;
    if !verify_detached(&message, &request.signature, &request.public_key) {
        return Err(ApiError::bad_signature());
    }

    let snapshot = request.into_snapshot(now)?;
    state.status.stats_repository().save(&snapshot).await?;
    debug!(node_id = %snapshot.node_id, height = snapshot.height, "stats stored");
    Ok(())
}
