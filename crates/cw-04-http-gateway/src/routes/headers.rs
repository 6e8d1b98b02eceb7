//! `POST /headers`

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::domain::payload::FieldReader;
use crate::domain::requests::{signing_bytes, within_skew, HeadersRequest};
use crate::middleware::{ClientIp, ScopedLimit};
use crate::router::AppState;
use crate::routes::outcome;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use cw_02_snapshot_quorum::QuorumOutcome;
use cw_telemetry::{metric_inc, HEADER_SUBMISSIONS};
use serde_json::{json, Value};
use shared_crypto::verify_detached;
use tracing::info;

pub async fn submit_headers(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let result = admit(&state, &ip, &body).await;
    metric_inc!(HEADER_SUBMISSIONS, &[outcome(&result)]);
    let accepted = result?;

    Ok(Json(json!({
        "ok": true,
        "quorum": accepted.quorum,
        "required_quorum": accepted.required_quorum,
        "verified": accepted.verified,
        "bootstrap": accepted.bootstrap,
    })))
}

async fn admit(state: &AppState, ip: &str, body: &[u8]) -> ApiResult<QuorumOutcome> {
    let trust = &state.config.trust;
    let keys = &state.trust.headers;
    if trust.require_header_keys && keys.is_empty() {
        return Err(ApiError::misconfigured(codes::MISSING_HEADER_KEYS));
    }

    let admission = &state.config.admission;
    state
        .limiter
        .check_all(&[ScopedLimit::new(
            "headers_ip",
            ip,
            admission.headers_ip,
            codes::RATE_LIMITED,
        )])
        .await?;

    let reader = FieldReader::parse(body)?;
    let mut request = HeadersRequest::read(&reader)?;

    let now = state.now();
    if !within_skew(now, request.last_block_time, admission.block_time_skew_secs()) {
        return Err(ApiError::timestamp_skew());
    }
    request.read_metrics(&reader)?;

    if !keys.admits(&request.public_key, trust.require_header_keys) {
        return Err(ApiError::untrusted_key());
    }

    if let Some(expected) = trust.expected_network() {
        if request.network_id.as_deref() != Some(expected) {
            return Err(ApiError::forbidden(codes::NETWORK_ID_MISMATCH));
        }
    }

    let message = signing_bytes(&request.signed())?;
    if !verify_detached(&message, &request.signature, &request.public_key) {
        return Err(ApiError::bad_signature());
    }

    let known_peers = state.registry.list_deduped().await?.len();
    let signer = request.public_key.clone();
    let outcome = state
        .quorum
        .submit(request.into_snapshot(now), &signer, known_peers)
        .await?;

    info!(
        fingerprint = %outcome.fingerprint,
        quorum = outcome.quorum,
        required = outcome.required_quorum,
        verified = outcome.verified,
        "header snapshot accepted"
    );
    Ok(outcome)
}
