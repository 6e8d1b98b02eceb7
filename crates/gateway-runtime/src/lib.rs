//! # Chainwatch Gateway Runtime
//!
//! Process wiring for the gateway binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file named by `CW_CONFIG`, then `CW_*` env)
//! 2. Install logging and register metrics
//! 3. Build the in-memory store and the upstream HTTP clients
//! 4. Construct the gateway service (validates the configuration)
//! 5. Start the expiry sweeper
//! 6. Serve until Ctrl-C, then drain in-flight requests

pub mod config;

use anyhow::{Context, Result};
use cw_04_http_gateway::{GatewayConfig, GatewayService, Upstreams};
use shared_store::MemoryStore;
use shared_types::SystemTimeSource;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{load_config, load_with, LoadError};

/// The gateway process: service plus the store it runs on.
pub struct GatewayRuntime {
    service: GatewayService,
    store: Arc<MemoryStore>,
}

impl GatewayRuntime {
    /// Build every subsystem over a fresh in-memory store.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let clock = Arc::new(SystemTimeSource);
        let store = Arc::new(MemoryStore::with_time_source(clock.clone()));
        let upstreams =
            Upstreams::http(&config.selector).context("failed to build upstream clients")?;
        let service = GatewayService::new(config, store.clone(), clock, upstreams)
            .context("invalid gateway configuration")?;
        Ok(Self { service, store })
    }

    pub fn service(&self) -> &GatewayService {
        &self.service
    }

    /// Serve on the configured address until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.service.config().http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn run_on<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("===========================================");
        info!("  Chainwatch Gateway v{}", cw_04_http_gateway::VERSION);
        info!("===========================================");

        let sweeper = self.service.spawn_cleanup(Some(Arc::clone(&self.store)));
        let served = self.service.serve(listener, shutdown).await;
        sweeper.abort();

        served.context("gateway server failed")?;
        info!("shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
    }
}
