//! Gateway error types.
//!
//! Request failures are [`ApiError`]s: an HTTP status plus a stable
//! snake_case code, rendered as `{"ok":false,"error":<code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cw_01_peer_registry::RegistryError;
use cw_02_snapshot_quorum::QuorumError;
use cw_03_status_selector::SelectorError;
use shared_store::StoreError;
use shared_types::EntityError;
use std::borrow::Cow;
use std::fmt;
use tracing::error;

/// Error codes shared by several endpoints
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const TIMESTAMP_SKEW: &str = "timestamp_skew";
    pub const BAD_SIGNATURE: &str = "bad_signature";
    pub const UNTRUSTED_KEY: &str = "untrusted_key";
    pub const INVALID_PORT: &str = "invalid_port";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const SUBNET_RATE_LIMITED: &str = "subnet_rate_limited";
    pub const INVALID_HEADERS: &str = "invalid_headers";
    pub const INVALID_HEADER_CHAIN: &str = "invalid_header_chain";
    pub const NETWORK_ID_MISMATCH: &str = "network_id_mismatch";
    pub const INVALID_DIFFICULTY: &str = "invalid_difficulty";
    pub const INVALID_HASHRATE: &str = "invalid_hashrate";
    pub const MISSING_ANNOUNCE_KEYS: &str = "server_missing_trusted_announce_keys";
    pub const MISSING_HEADER_KEYS: &str = "server_missing_trusted_header_keys";
    pub const MISSING_STATS_KEYS: &str = "server_missing_trusted_stats_keys";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const UNTRUSTED_PUBLISHER: &str = "untrusted_publisher";
    pub const MISSING_PUBLISH_TOKEN: &str = "server_missing_publish_token";
    pub const NOT_PUBLISHED: &str = "bootstrap_not_published";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// API error with HTTP status and code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: Cow<'static, str>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            code: code.into(),
        }
    }

    pub fn bad_request(code: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code)
    }

    /// `missing_<field>`
    pub fn missing(field: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("missing_{field}"))
    }

    /// `invalid_<field>`
    pub fn invalid(field: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("invalid_{field}"))
    }

    pub fn invalid_json() -> Self {
        Self::bad_request(codes::INVALID_JSON)
    }

    pub fn timestamp_skew() -> Self {
        Self::bad_request(codes::TIMESTAMP_SKEW)
    }

    pub fn bad_signature() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::BAD_SIGNATURE)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED)
    }

    pub fn forbidden(code: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, code)
    }

    pub fn untrusted_key() -> Self {
        Self::forbidden(codes::UNTRUSTED_KEY)
    }

    pub fn rate_limited(code: &'static str) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, code)
    }

    pub fn not_found(code: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, code)
    }

    /// Server-side misconfiguration
    pub fn misconfigured(code: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code)
    }

    pub fn storage(details: impl fmt::Display) -> Self {
        error!(error = %details, "storage failure");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::STORAGE_ERROR)
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.code)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "ok": false, "error": self.code });
        (self.status, Json(body)).into_response()
    }
}

// Conversions from subsystem errors

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::storage(e)
    }
}

impl From<EntityError> for ApiError {
    fn from(e: EntityError) -> Self {
        match e {
            EntityError::InvalidPort(_) => ApiError::bad_request(codes::INVALID_PORT),
            EntityError::EmptyField(field) => ApiError::missing(field),
            EntityError::EmptyHeaders { .. } => ApiError::bad_request(codes::INVALID_HEADERS),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidRecord(inner) => inner.into(),
            RegistryError::Store(inner) => inner.into(),
        }
    }
}

impl From<QuorumError> for ApiError {
    fn from(e: QuorumError) -> Self {
        match e {
            QuorumError::Chain(_) => ApiError::bad_request(codes::INVALID_HEADER_CHAIN),
            QuorumError::Snapshot(inner) => inner.into(),
            QuorumError::Store(inner) => inner.into(),
        }
    }
}

impl From<SelectorError> for ApiError {
    fn from(e: SelectorError) -> Self {
        ApiError::storage(e)
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Upstream client construction failed
    #[error("client setup error: {0}")]
    Client(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server terminated abnormally
    #[error("server error: {0}")]
    Serve(String),
}
