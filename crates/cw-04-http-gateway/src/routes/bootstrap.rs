//! Bootstrap archive pointer: publication and reads.
//!
//! The pointer lives at `bootstrap:latest` with no TTL. Publishing needs the
//! operator token; when trusted publishers are configured the pointer must
//! also carry a valid `manifest_sig` from one of them.

use crate::domain::error::{codes, ApiError, ApiResult};
use crate::domain::payload::FieldReader;
use crate::domain::requests::{read_pointer, signing_bytes, PointerSigned};
use crate::middleware::bearer_matches;
use crate::router::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use shared_crypto::verify_detached;
use shared_store::{keys, KvStoreExt};
use shared_types::BootstrapPointer;
use tracing::{info, warn};

/// `POST /bootstrap/pointer`
pub async fn publish_pointer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let token = state
        .config
        .bootstrap
        .token()
        .ok_or_else(|| ApiError::misconfigured(codes::MISSING_PUBLISH_TOKEN))?;
    if !bearer_matches(&headers, token) {
        warn!("bootstrap publish with bad token");
        return Err(ApiError::unauthorized());
    }

    let reader = FieldReader::parse(&body)?;
    let pointer = read_pointer(&reader, state.now())?;
    check_publisher(&state, &pointer)?;

    state
        .store
        .set_json(keys::BOOTSTRAP_LATEST, &pointer, None)
        .await?;
    info!(url = %pointer.url, height = ?pointer.height, "bootstrap pointer published");

    Ok(Json(json!({ "ok": true, "latest": pointer })))
}

/// With trusted publishers configured the pointer must be signed by one of
/// them. Without, a pointer that carries both key and signature must still
/// verify.
fn check_publisher(state: &AppState, pointer: &BootstrapPointer) -> ApiResult<()> {
    let publishers = &state.trust.publishers;
    let key = pointer.publisher_pubkey.as_deref();
    let sig = pointer.manifest_sig.as_deref();

    if !publishers.is_empty() {
        let key = key
            .filter(|k| publishers.contains(k))
            .ok_or_else(|| ApiError::forbidden(codes::UNTRUSTED_PUBLISHER))?;
        return verify_pointer(pointer, key, sig.unwrap_or(""));
    }

    match (key, sig) {
        (Some(key), Some(sig)) => verify_pointer(pointer, key, sig),
        _ => Ok(()),
    }
}

fn verify_pointer(pointer: &BootstrapPointer, key: &str, sig: &str) -> ApiResult<()> {
    let message = signing_bytes(&PointerSigned::from(pointer))?;
    if verify_detached(&message, sig, key) {
        Ok(())
    } else {
        Err(ApiError::bad_signature())
    }
}

async fn load(state: &AppState) -> ApiResult<Option<BootstrapPointer>> {
    Ok(state.store.get_json(keys::BOOTSTRAP_LATEST).await?)
}

/// `GET /bootstrap/latest`
pub async fn latest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let latest = load(&state).await?;
    Ok(Json(json!({ "ok": true, "latest": latest })))
}

/// `GET /bootstrap/manifest`
pub async fn manifest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let manifest = load(&state)
        .await?
        .ok_or_else(|| ApiError::not_found(codes::NOT_PUBLISHED))?;
    Ok(Json(json!({ "ok": true, "manifest": manifest })))
}

/// `GET /bootstrap/status`
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let latest = load(&state).await?;
    Ok(Json(json!({
        "ok": true,
        "latest": latest,
        "configured": {
            "publish_token": state.config.bootstrap.token().is_some(),
            "trusted_publishers": state.trust.publishers.len(),
        },
    })))
}

/// `GET /bootstrap/blockchain.db.zip`: stable path that redirects to the
/// current archive.
pub async fn archive_redirect(State(state): State<AppState>) -> ApiResult<Response> {
    let pointer = load(&state)
        .await?
        .ok_or_else(|| ApiError::not_found(codes::NOT_PUBLISHED))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, pointer.url)]).into_response())
}
