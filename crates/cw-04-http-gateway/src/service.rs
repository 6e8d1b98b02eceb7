//! Gateway service - wires the subsystems and serves HTTP.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::RateLimiter;
use crate::router::{build_router, AppState, TrustSets};
use axum::Router;
use cw_01_peer_registry::PeerRegistry;
use cw_02_snapshot_quorum::SnapshotQuorumEngine;
use cw_03_status_selector::{
    HttpIndexerClient, HttpStatsProbe, IndexerClient, SelectorConfig, StatsProbe,
    StatsRepository, StatusDependencies, StatusService,
};
use shared_store::{KvStore, MemoryStore};
use shared_types::TimeSource;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outbound collaborators of the status selector.
pub struct Upstreams {
    pub indexer: Option<Arc<dyn IndexerClient>>,
    pub probe: Arc<dyn StatsProbe>,
}

impl Upstreams {
    /// reqwest clients; no indexer unless `stats_api_url` is set.
    pub fn http(config: &SelectorConfig) -> Result<Self, GatewayError> {
        let indexer: Option<Arc<dyn IndexerClient>> = match &config.stats_api_url {
            Some(url) => Some(Arc::new(
                HttpIndexerClient::new(url.clone(), config.indexer_timeout())
                    .map_err(|e| GatewayError::Client(e.to_string()))?,
            )),
            None => None,
        };
        let probe = HttpStatsProbe::new(config.peer_stats_timeout())
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            indexer,
            probe: Arc::new(probe),
        })
    }
}

/// Gateway service state
pub struct GatewayService {
    state: AppState,
}

impl GatewayService {
    /// Validate the configuration and build every subsystem over `store`.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn TimeSource>,
        upstreams: Upstreams,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let trust = TrustSets::from_config(&config);
        if config.trust.require_header_keys && trust.headers.is_empty() {
            warn!("no trusted header keys configured; header submissions will be refused");
        }

        let registry = Arc::new(PeerRegistry::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.registry.clone(),
        ));
        let quorum = Arc::new(SnapshotQuorumEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&trust.headers),
            config.quorum.clone(),
        ));
        let stats = Arc::new(StatsRepository::new(
            Arc::clone(&store),
            config.selector.stats_ttl_secs,
            config.selector.stats_latest_ttl_secs,
        ));
        let status = Arc::new(StatusService::new(
            StatusDependencies {
                registry: Arc::clone(&registry),
                quorum: Arc::clone(&quorum),
                stats,
                indexer: upstreams.indexer,
                probe: upstreams.probe,
                clock: Arc::clone(&clock),
            },
            config.selector.clone(),
        ));
        let limiter = RateLimiter::from_kind(
            config.admission.backend,
            Arc::clone(&store),
            Arc::clone(&clock),
        );

        info!(
            announce_keys = trust.announce.len(),
            header_keys = trust.headers.len(),
            stats_keys = trust.stats.len(),
            publishers = trust.publishers.len(),
            rate_limit_backend = ?config.admission.backend,
            "gateway configured"
        );

        Ok(Self {
            state: AppState {
                config: Arc::new(config),
                store,
                clock,
                limiter,
                trust: Arc::new(trust),
                registry,
                quorum,
                status,
            },
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// Router with the full middleware stack.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Periodically drop rolled-over rate-limit windows and, when the
    /// gateway runs on the in-memory store, expired entries.
    pub fn spawn_cleanup(&self, memory_store: Option<Arc<MemoryStore>>) -> JoinHandle<()> {
        let limiter = self.state.limiter.clone();
        let every = Duration::from_secs(self.state.config.storage.purge_interval_secs.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let windows = limiter.purge_expired();
                let entries = memory_store.as_ref().map_or(0, |s| s.purge_expired());
                if windows + entries > 0 {
                    debug!(windows, entries, "purged expired state");
                }
            }
        })
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(addr = %addr, "gateway listening");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("gateway stopped");
        Ok(())
    }

    /// Bind the configured address and serve.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }
}
