//! Configuration loading: an optional TOML file, then `CW_*` overrides.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CW_CONFIG` | path of the TOML file |
//! | `CW_HOST`, `CW_PORT` | `http.host`, `http.port` |
//! | `CW_COMMIT` | `http.commit` |
//! | `CW_REQUEST_TIMEOUT_SECS` | `http.request_timeout_secs` |
//! | `CW_MAX_SKEW_SECS` | `admission.max_skew_secs` |
//! | `CW_RATE_LIMIT_BACKEND` | `admission.backend` (`memory` or `store`) |
//! | `CW_TRUSTED_ANNOUNCE_KEYS` | `trust.announce_keys` (CSV) |
//! | `CW_TRUSTED_HEADER_KEYS` | `trust.header_keys` (CSV) |
//! | `CW_TRUSTED_STATS_KEYS` | `trust.stats_keys` (CSV) |
//! | `CW_TRUSTED_PUBLISHERS` | `trust.publisher_keys` (CSV) |
//! | `CW_REQUIRE_ANNOUNCE_KEYS` | `trust.require_announce_keys` |
//! | `CW_REQUIRE_HEADER_KEYS` | `trust.require_header_keys` |
//! | `CW_REQUIRE_STATS_KEYS` | `trust.require_stats_keys` |
//! | `CW_NETWORK_ID` | `trust.expected_network_id` |
//! | `CW_QUORUM`, `CW_MIN_QUORUM` | `quorum.quorum`, `quorum.min_quorum` |
//! | `CW_BOOTSTRAP_THRESHOLD`, `CW_BOOTSTRAP_QUORUM` | bootstrap quorum rule |
//! | `CW_ALLOW_SINGLE_SIGNER_BOOTSTRAP` | `quorum.allow_single_signer_bootstrap` |
//! | `CW_PEER_TTL_SECS` | `registry.peer_ttl_secs` |
//! | `CW_STATS_API_URL` | `selector.stats_api_url` |
//! | `CW_CACHE_TTL_MS` | `selector.cache_ttl_ms` |
//! | `CW_PUBLISH_TOKEN` | `bootstrap.publish_token` |

use cw_04_http_gateway::{GatewayConfig, RateLimitBackendKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "CW_CONFIG";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

/// Load from the process environment.
pub fn load_config() -> Result<GatewayConfig, LoadError> {
    let env = |name: &str| std::env::var(name).ok();
    let path = env(CONFIG_PATH_VAR).map(PathBuf::from);
    load_with(path.as_deref(), env)
}

/// Load from `path` (when given) and apply overrides read through `env`.
pub fn load_with<E>(path: Option<&Path>, env: E) -> Result<GatewayConfig, LoadError>
where
    E: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => GatewayConfig::default(),
    };
    apply_env(&mut config, &Overrides { env })?;
    Ok(config)
}

fn from_file(path: &Path) -> Result<GatewayConfig, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

struct Overrides<E> {
    env: E,
}

impl<E: Fn(&str) -> Option<String>> Overrides<E> {
    /// Non-blank value of `var`.
    fn raw(&self, var: &str) -> Option<String> {
        (self.env)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: FromStr>(&self, var: &'static str, slot: &mut T) -> Result<(), LoadError> {
        if let Some(value) = self.raw(var) {
            *slot = value.parse().map_err(|_| LoadError::Env { var, value })?;
        }
        Ok(())
    }

    fn flag(&self, var: &'static str, slot: &mut bool) -> Result<(), LoadError> {
        if let Some(value) = self.raw(var) {
            *slot = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(LoadError::Env { var, value }),
            };
        }
        Ok(())
    }

    fn text(&self, var: &str, slot: &mut Option<String>) {
        if let Some(value) = self.raw(var) {
            *slot = Some(value);
        }
    }

    fn keys(&self, var: &str, slot: &mut Vec<String>) {
        if let Some(value) = self.raw(var) {
            *slot = value
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
    }
}

fn apply_env<E>(config: &mut GatewayConfig, o: &Overrides<E>) -> Result<(), LoadError>
where
    E: Fn(&str) -> Option<String>,
{
    o.parsed("CW_HOST", &mut config.http.host)?;
    o.parsed("CW_PORT", &mut config.http.port)?;
    o.text("CW_COMMIT", &mut config.http.commit);
    o.parsed("CW_REQUEST_TIMEOUT_SECS", &mut config.http.request_timeout_secs)?;

    o.parsed("CW_MAX_SKEW_SECS", &mut config.admission.max_skew_secs)?;
    if let Some(value) = o.raw("CW_RATE_LIMIT_BACKEND") {
        config.admission.backend = match value.to_ascii_lowercase().as_str() {
            "memory" => RateLimitBackendKind::Memory,
            "store" => RateLimitBackendKind::Store,
            _ => {
                return Err(LoadError::Env {
                    var: "CW_RATE_LIMIT_BACKEND",
                    value,
                })
            }
        };
    }

    let trust = &mut config.trust;
    o.keys("CW_TRUSTED_ANNOUNCE_KEYS", &mut trust.announce_keys);
    o.keys("CW_TRUSTED_HEADER_KEYS", &mut trust.header_keys);
    o.keys("CW_TRUSTED_STATS_KEYS", &mut trust.stats_keys);
    o.keys("CW_TRUSTED_PUBLISHERS", &mut trust.publisher_keys);
    o.flag("CW_REQUIRE_ANNOUNCE_KEYS", &mut trust.require_announce_keys)?;
    o.flag("CW_REQUIRE_HEADER_KEYS", &mut trust.require_header_keys)?;
    o.flag("CW_REQUIRE_STATS_KEYS", &mut trust.require_stats_keys)?;
    o.text("CW_NETWORK_ID", &mut trust.expected_network_id);

    let quorum = &mut config.quorum;
    o.parsed("CW_QUORUM", &mut quorum.quorum)?;
    o.parsed("CW_MIN_QUORUM", &mut quorum.min_quorum)?;
    o.parsed("CW_BOOTSTRAP_THRESHOLD", &mut quorum.bootstrap_threshold)?;
    o.parsed("CW_BOOTSTRAP_QUORUM", &mut quorum.bootstrap_quorum)?;
    o.flag(
        "CW_ALLOW_SINGLE_SIGNER_BOOTSTRAP",
        &mut quorum.allow_single_signer_bootstrap,
    )?;

    o.parsed("CW_PEER_TTL_SECS", &mut config.registry.peer_ttl_secs)?;

    o.text("CW_STATS_API_URL", &mut config.selector.stats_api_url);
    o.parsed("CW_CACHE_TTL_MS", &mut config.selector.cache_ttl_ms)?;

    o.text("CW_PUBLISH_TOKEN", &mut config.bootstrap.publish_token);
    Ok(())
}
