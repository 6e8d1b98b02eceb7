//! Application state and route table.

use crate::domain::config::GatewayConfig;
use crate::middleware::{create_cors_layer, no_store, RateLimiter, TracingLayer};
use crate::routes;
use axum::routing::{get, post};
use axum::Router;
use cw_01_peer_registry::PeerRegistry;
use cw_02_snapshot_quorum::SnapshotQuorumEngine;
use cw_03_status_selector::StatusService;
use shared_crypto::TrustedKeys;
use shared_store::KvStore;
use shared_types::TimeSource;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

/// Allow-lists resolved once from configuration.
#[derive(Debug, Default)]
pub struct TrustSets {
    pub announce: TrustedKeys,
    /// Shared with the quorum engine.
    pub headers: Arc<TrustedKeys>,
    pub stats: TrustedKeys,
    pub publishers: TrustedKeys,
}

impl TrustSets {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            announce: config.trust.announce(),
            headers: Arc::new(config.trust.headers()),
            stats: config.trust.stats(),
            publishers: config.trust.publishers(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub store: Arc<dyn KvStore>,
    pub clock: Arc<dyn TimeSource>,
    pub limiter: RateLimiter,
    pub trust: Arc<TrustSets>,
    pub registry: Arc<PeerRegistry>,
    pub quorum: Arc<SnapshotQuorumEngine>,
    pub status: Arc<StatusService>,
}

impl AppState {
    pub fn now(&self) -> u64 {
        self.clock.now_secs()
    }
}

/// Build the HTTP router with the full middleware stack.
pub fn build_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TracingLayer::new())
        .layer(TimeoutLayer::new(state.config.http.request_timeout()))
        .layer(create_cors_layer())
        .layer(axum::middleware::map_response(no_store));

    Router::new()
        .route("/announce", post(routes::announce::announce))
        .route("/peers", get(routes::reads::peers))
        .route(
            "/headers",
            post(routes::headers::submit_headers).get(routes::reads::headers_snapshot),
        )
        .route("/snapshot-history", get(routes::reads::snapshot_history))
        .route("/pending-snapshots", get(routes::reads::pending_snapshots))
        .route("/chain-snapshot", get(routes::reads::chain_snapshot))
        .route("/stats", post(routes::stats::submit_stats))
        .route("/stats-latest", get(routes::reads::stats_latest))
        .route("/bootstrap/pointer", post(routes::bootstrap::publish_pointer))
        .route("/bootstrap/latest", get(routes::bootstrap::latest))
        .route("/bootstrap/manifest", get(routes::bootstrap::manifest))
        .route("/bootstrap/status", get(routes::bootstrap::status))
        .route(
            "/bootstrap/blockchain.db.zip",
            get(routes::bootstrap::archive_redirect),
        )
        .route("/health", get(routes::system::health))
        .route("/version", get(routes::system::version))
        .route("/metrics", get(routes::system::metrics))
        .layer(middleware)
        .with_state(state)
}
