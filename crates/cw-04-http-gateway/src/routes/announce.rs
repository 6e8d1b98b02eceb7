//! `POST /announce`

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::domain::payload::FieldReader;
use crate::domain::requests::{signing_bytes, within_skew, AnnounceRequest};
use crate::middleware::{subnet_key, ClientIp, ScopedLimit};
use crate::router::AppState;
use crate::routes::outcome;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use cw_telemetry::{metric_inc, ANNOUNCEMENTS};
use serde_json::{json, Value};
use shared_crypto::verify_detached;
use shared_types::PeerRecord;

pub async fn announce(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let result = admit(&state, &ip, &body).await;
    metric_inc!(ANNOUNCEMENTS, &[outcome(&result)]);
    result?;
    Ok(Json(json!({ "ok": true })))
}

async fn admit(state: &AppState, ip: &str, body: &[u8]) -> ApiResult<PeerRecord> {
    let require_keys = state.config.trust.require_announce_keys;
    if require_keys && state.trust.announce.is_empty() {
        return Err(ApiError::misconfigured(codes::MISSING_ANNOUNCE_KEYS));
    }

    let admission = &state.config.admission;

    let subnet = subnet_key(ip);
    let mut limits = vec![ScopedLimit::new(
        "announce_ip",
        ip,
        admission.announce_ip,
        codes::RATE_LIMITED,
    )];
    if let Some(subnet) = subnet.as_deref() {
        limits.push(ScopedLimit::new(
            "announce_subnet",
            subnet,
            admission.announce_subnet,
            codes::SUBNET_RATE_LIMITED,
        ));
    }
    state.limiter.check_all(&limits).await?;

    let reader = FieldReader::parse(body)?;
    let request = AnnounceRequest::read(&reader)?;

    if !within_skew(state.now(), request.last_seen, admission.max_skew_secs) {
        return Err(ApiError::timestamp_skew());
    }

    let message = signing_bytes(&request.signed(ip))?;
    if !verify_detached(&message, &request.signature, &request.public_key) {
        return Err(ApiError::bad_signature());
    }

    if !state
        .trust
        .announce
        .admits(&request.public_key, require_keys)
    {
        return Err(ApiError::untrusted_key());
    }

    let record = request.into_record(ip)?;
    Ok(state.registry.upsert(record).await?)
}
