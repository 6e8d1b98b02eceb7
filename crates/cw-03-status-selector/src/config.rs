//! Selector configuration.

use crate::domain::SelectionRules;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Indexer stats endpoint; no indexer candidate when unset.
    pub stats_api_url: Option<String>,
    pub indexer_timeout_ms: u64,

    pub peer_stats_enabled: bool,
    pub peer_stats_timeout_ms: u64,
    pub peer_stats_port_default: u16,
    /// Probe only peers within this many blocks of the tallest announcer.
    pub peer_stats_max_lag: u64,
    pub peer_stats_max_attempts: usize,
    pub peer_stats_max_successes: usize,
    pub peer_stats_allow_private: bool,

    pub push_stats_enabled: bool,
    pub push_stats_max_lag: u64,

    pub signed_snapshot_max_lag: u64,
    pub stats_max_age_secs: u64,
    pub source_sticky_secs: u64,
    pub source_switch_min_height_delta: u64,
    pub stale_secs: u64,

    pub cache_ttl_ms: u64,

    /// TTL of each `stats:<node_id>` record.
    pub stats_ttl_secs: u64,
    /// TTL of `stats:latest`.
    pub stats_latest_ttl_secs: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            stats_api_url: None,
            indexer_timeout_ms: 2000,
            peer_stats_enabled: true,
            peer_stats_timeout_ms: 1500,
            peer_stats_port_default: 8787,
            peer_stats_max_lag: 50,
            peer_stats_max_attempts: 4,
            peer_stats_max_successes: 2,
            peer_stats_allow_private: false,
            push_stats_enabled: true,
            push_stats_max_lag: 50,
            signed_snapshot_max_lag: 2,
            stats_max_age_secs: 600,
            source_sticky_secs: 6,
            source_switch_min_height_delta: 2,
            stale_secs: 900,
            cache_ttl_ms: 3000,
            stats_ttl_secs: 600,
            stats_latest_ttl_secs: 1200,
        }
    }
}

impl SelectorConfig {
    pub fn rules(&self) -> SelectionRules {
        SelectionRules {
            signed_snapshot_max_lag: self.signed_snapshot_max_lag,
            stats_max_age_secs: self.stats_max_age_secs,
            source_sticky_secs: self.source_sticky_secs,
            source_switch_min_height_delta: self.source_switch_min_height_delta,
            stale_secs: self.stale_secs,
        }
    }

    pub fn indexer_timeout(&self) -> Duration {
        Duration::from_millis(self.indexer_timeout_ms)
    }

    pub fn peer_stats_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_stats_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rules() {
        let config = SelectorConfig::default();
        assert_eq!(config.rules(), SelectionRules::default());
        assert_eq!(config.indexer_timeout(), Duration::from_secs(2));
        assert_eq!(config.stats_latest_ttl_secs, 2 * config.stats_ttl_secs);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{"stats_api_url":"http://idx/stats","cache_ttl_ms":500}"#).unwrap();
        assert_eq!(config.stats_api_url.as_deref(), Some("http://idx/stats"));
        assert_eq!(config.cache_ttl_ms, 500);
        assert_eq!(config.peer_stats_max_attempts, 4);
    }
}
