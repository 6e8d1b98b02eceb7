//! Read endpoints over the registry, the quorum engine and the selector.

use crate::domain::error::ApiResult;
use crate::router::AppState;
use crate::routes::LimitQuery;
use axum::extract::{Query, State};
use axum::Json;
use cw_03_status_selector::StatusPayload;
use serde_json::{json, Value};
use std::cmp::Reverse;

const PEERS_DEFAULT: usize = 50;
const PEERS_MAX: usize = 200;
const PENDING_DEFAULT: usize = 20;
const PENDING_MAX: usize = 100;

/// `GET /peers`: deduplicated, ranked announcers.
pub async fn peers(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.clamped(PEERS_DEFAULT, PEERS_MAX);
    let peers = state.registry.list_ranked(limit).await?;
    Ok(Json(json!({ "ok": true, "count": peers.len(), "peers": peers })))
}

/// `GET /headers`: the canonical snapshot, possibly `null`.
pub async fn headers_snapshot(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let snapshot = state.quorum.canonical().await?;
    Ok(Json(json!({ "ok": true, "snapshot": snapshot })))
}

/// `GET /snapshot-history`: newest first.
pub async fn snapshot_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let max = state.quorum.history_limit();
    let history = state.quorum.history(query.clamped(max, max)).await?;
    Ok(Json(json!({ "ok": true, "count": history.len(), "history": history })))
}

/// `GET /pending-snapshots`: highest first.
pub async fn pending_snapshots(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let mut pending = state.quorum.pending().await?;
    pending.truncate(query.clamped(PENDING_DEFAULT, PENDING_MAX));
    Ok(Json(json!({ "ok": true, "count": pending.len(), "pending": pending })))
}

/// `GET /chain-snapshot`: the selected chain status.
pub async fn chain_snapshot(State(state): State<AppState>) -> Json<StatusPayload> {
    Json(state.status.status().await)
}

/// `GET /stats-latest`: the `latest` pointer, else the most recently
/// received per-node record.
pub async fn stats_latest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let repository = state.status.stats_repository();
    if let Some(latest) = repository.latest().await? {
        return Ok(Json(json!({ "ok": true, "count": 1, "latest": latest })));
    }

    let mut all = repository.list().await?;
    all.sort_by_key(|s| Reverse(s.received_at));
    Ok(Json(json!({
        "ok": true,
        "count": all.len(),
        "latest": all.first(),
    })))
}
