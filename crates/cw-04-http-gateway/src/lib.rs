//! # HTTP Gateway Subsystem
//!
//! **Subsystem ID:** 4
//!
//! The public face of Chainwatch: admission control for the three signed
//! ingest endpoints and the JSON read API over the other subsystems.
//!
//! # Architecture
//!
//! ```text
//!            POST /announce     POST /headers      POST /stats     POST /bootstrap/pointer
//!                 │                  │                  │                  │
//!  ┌──────────────┴──────────────────┴──────────────────┴──────────────────┴──────┐
//!  │  Tracing → Timeout → CORS → no-store                                         │
//!  │  key config → rate limit → JSON → fields → skew → trust → signature          │
//!  └──────┬──────────────────┬──────────────────┬──────────────────┬──────────────┘
//!         ▼                  ▼                  ▼                  ▼
//!    cw-01 registry    cw-02 quorum     cw-03 stats repo    bootstrap:latest
//!         │                  │                  │
//!         └──────────────────┴────────┬─────────┘
//!                                     ▼
//!                       cw-03 StatusService → GET /chain-snapshot
//! ```
//!
//! Every failure is an [`ApiError`] rendered as `{"ok":false,"error":<code>}`
//! with a stable snake_case code; every response is `cache-control: no-store`.
//!
//! # Usage
//!
//! ```ignore
//! use cw_04_http_gateway::{GatewayConfig, GatewayService, Upstreams};
//!
//! let config = GatewayConfig::default();
//! let upstreams = Upstreams::http(&config.selector)?;
//! let service = GatewayService::new(config, store, clock, upstreams)?;
//! service.start(shutdown_signal()).await?;
//! ```

pub mod domain;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod service;


pub use domain::config::{
    AdmissionConfig, BootstrapConfig, ConfigError, GatewayConfig, HttpConfig,
    RateLimitBackendKind, StorageConfig, TrustConfig, WindowLimit,
};
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use middleware::{RateLimiter, ScopedLimit};
pub use router::{build_router, AppState, TrustSets};
pub use service::{GatewayService, Upstreams};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
