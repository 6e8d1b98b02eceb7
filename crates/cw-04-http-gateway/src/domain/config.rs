//! Gateway configuration with validation.
//!
//! Every section deserializes with defaults, so a partial TOML file or an
//! empty one yields a working single-instance gateway.

use cw_01_peer_registry::RegistryConfig;
use cw_02_snapshot_quorum::QuorumConfig;
use cw_03_status_selector::SelectorConfig;
use serde::{Deserialize, Serialize};
use shared_crypto::TrustedKeys;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Skew tolerance and rate limits
    pub admission: AdmissionConfig,
    /// Trusted key allow-lists
    pub trust: TrustConfig,
    /// Snapshot quorum policy
    pub quorum: QuorumConfig,
    /// Peer registry
    pub registry: RegistryConfig,
    /// Status source selection
    pub selector: SelectorConfig,
    /// Bootstrap pointer publication
    pub bootstrap: BootstrapConfig,
    /// Key-value storage
    pub storage: StorageConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout_secs cannot be 0".into(),
            ));
        }

        if self.admission.max_skew_secs == 0 {
            return Err(ConfigError::InvalidAdmission(
                "max_skew_secs cannot be 0".into(),
            ));
        }

        for (name, limit) in self.admission.limits() {
            if limit.limit == 0 || limit.window_secs == 0 {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "{name} needs a non-zero limit and window"
                )));
            }
        }

        if self.quorum.history_limit == 0 {
            return Err(ConfigError::InvalidQuorum(
                "history_limit cannot be 0".into(),
            ));
        }

        if self.selector.cache_ttl_ms == 0 {
            return Err(ConfigError::InvalidSelector(
                "cache_ttl_ms cannot be 0".into(),
            ));
        }
        if let Some(url) = &self.selector.stats_api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidSelector(format!(
                    "stats_api_url must be http(s): {url}"
                )));
            }
        }

        if self.registry.peer_ttl_secs == 0 {
            return Err(ConfigError::InvalidRegistry(
                "peer_ttl_secs cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid admission settings: {0}")]
    InvalidAdmission(String),
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    #[error("invalid quorum settings: {0}")]
    InvalidQuorum(String),
    #[error("invalid selector settings: {0}")]
    InvalidSelector(String),
    #[error("invalid registry settings: {0}")]
    InvalidRegistry(String),
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
    /// Name reported by `/health`
    pub service_name: String,
    /// Build commit reported by `/version`
    pub commit: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            request_timeout_secs: 10,
            service_name: "chainwatch-gateway".to_string(),
            commit: None,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A fixed-window allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimit {
    pub limit: u64,
    pub window_secs: u64,
}

impl WindowLimit {
    pub const fn new(limit: u64, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }
}

/// Where rate-limit counters live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackendKind {
    /// Per-instance counters
    #[default]
    Memory,
    /// Counters in the shared key-value store
    Store,
}

/// Admission control: timestamp skew and per-endpoint rate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Allowed skew of announce `last_seen`; header and stats timestamps
    /// get 24 times this.
    pub max_skew_secs: u64,
    pub announce_ip: WindowLimit,
    pub announce_subnet: WindowLimit,
    pub headers_ip: WindowLimit,
    pub stats_ip: WindowLimit,
    pub backend: RateLimitBackendKind,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_skew_secs: 600,
            announce_ip: WindowLimit::new(10, 60),
            announce_subnet: WindowLimit::new(30, 60),
            headers_ip: WindowLimit::new(10, 60),
            stats_ip: WindowLimit::new(10, 60),
            backend: RateLimitBackendKind::Memory,
        }
    }
}

impl AdmissionConfig {
    /// Skew allowed on `last_block_time` of headers and stats.
    pub fn block_time_skew_secs(&self) -> u64 {
        self.max_skew_secs.saturating_mul(24)
    }

    fn limits(&self) -> [(&'static str, WindowLimit); 4] {
        [
            ("announce_ip", self.announce_ip),
            ("announce_subnet", self.announce_subnet),
            ("headers_ip", self.headers_ip),
            ("stats_ip", self.stats_ip),
        ]
    }
}

/// Trusted key allow-lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub announce_keys: Vec<String>,
    pub header_keys: Vec<String>,
    pub stats_keys: Vec<String>,
    pub publisher_keys: Vec<String>,
    /// Reject every announce when `announce_keys` is empty.
    pub require_announce_keys: bool,
    /// Refuse header submissions while `header_keys` is empty.
    pub require_header_keys: bool,
    /// Refuse stats submissions while `stats_keys` is empty.
    pub require_stats_keys: bool,
    /// When set, header snapshots must carry this `network_id`.
    pub expected_network_id: Option<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            announce_keys: Vec::new(),
            header_keys: Vec::new(),
            stats_keys: Vec::new(),
            publisher_keys: Vec::new(),
            require_announce_keys: false,
            require_header_keys: true,
            require_stats_keys: false,
            expected_network_id: None,
        }
    }
}

impl TrustConfig {
    pub fn announce(&self) -> TrustedKeys {
        TrustedKeys::new(&self.announce_keys)
    }

    pub fn headers(&self) -> TrustedKeys {
        TrustedKeys::new(&self.header_keys)
    }

    pub fn stats(&self) -> TrustedKeys {
        TrustedKeys::new(&self.stats_keys)
    }

    pub fn publishers(&self) -> TrustedKeys {
        TrustedKeys::new(&self.publisher_keys)
    }

    /// Expected network id, blank treated as unset.
    pub fn expected_network(&self) -> Option<&str> {
        self.expected_network_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Bootstrap pointer publication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Bearer token required to publish; publishing is refused when unset.
    pub publish_token: Option<String>,
}

impl BootstrapConfig {
    pub fn token(&self) -> Option<&str> {
        self.publish_token
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Key-value storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// How often expired in-memory entries are swept.
    pub purge_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            purge_interval_secs: 60,
        }
    }
}
