//! # Quorum Configuration

use serde::{Deserialize, Serialize};

/// Quorum engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumConfig {
    /// Configured signer quorum outside bootstrap mode.
    pub quorum: usize,

    /// Floor for `quorum`; never below 2.
    pub min_quorum: usize,

    /// Known peer count below which bootstrap mode applies.
    pub bootstrap_threshold: usize,

    /// Signer quorum in bootstrap mode.
    pub bootstrap_quorum: usize,

    /// Lets `bootstrap_quorum` go down to a single signer.
    pub allow_single_signer_bootstrap: bool,

    /// Pending record lifetime outside bootstrap mode.
    pub quorum_window_secs: u64,

    /// Pending record lifetime in bootstrap mode.
    pub bootstrap_pending_window_secs: u64,

    /// Canonical snapshot lifetime.
    pub snapshot_ttl_secs: u64,

    /// History ring capacity.
    pub history_limit: usize,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            quorum: 2,
            min_quorum: 2,
            bootstrap_threshold: 2,
            bootstrap_quorum: 1,
            allow_single_signer_bootstrap: false,
            quorum_window_secs: 3600,
            bootstrap_pending_window_secs: 900,
            snapshot_ttl_secs: 3600,
            history_limit: 48,
        }
    }
}
