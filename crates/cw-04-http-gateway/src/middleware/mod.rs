//! Middleware stack for the gateway.
//!
//! Layer order: Request → Tracing → Timeout → CORS → no-store → Handler.
//! Rate limiting is charged inside the ingest handlers, after the cheap
//! configuration checks and before the body is decoded.

pub mod auth;
pub mod client_ip;
pub mod cors;
pub mod rate_limit;
pub mod tracing;

pub use auth::{bearer_matches, constant_time_compare};
pub use client_ip::{resolve_client_ip, ClientIp, UNKNOWN_CLIENT};
pub use cors::create_cors_layer;
pub use rate_limit::{
    subnet_key, MemoryBackend, RateLimitBackend, RateLimiter, ScopedLimit, StoreBackend,
};
pub use self::tracing::{TracingLayer, TracingService};

use axum::http::{header, HeaderValue};
use axum::response::Response;

/// Every response is uncacheable.
pub async fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
