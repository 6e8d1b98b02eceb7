//! # Quorum Policy
//!
//! How many distinct trusted signers a snapshot needs.
//!
//! | Mode | Required |
//! |------|----------|
//! | normal | `max(quorum, max(2, min_quorum))` |
//! | bootstrap (few known peers) | `max(2, bootstrap_quorum)`, or `max(1, bootstrap_quorum)` with the single-signer override |

use crate::config::QuorumConfig;

/// Lowest quorum accepted outside bootstrap mode.
pub const QUORUM_FLOOR: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumPolicy {
    quorum: usize,
    min_quorum: usize,
    bootstrap_threshold: usize,
    bootstrap_quorum: usize,
    allow_single_signer_bootstrap: bool,
}

impl QuorumPolicy {
    pub fn from_config(config: &QuorumConfig) -> Self {
        Self {
            quorum: config.quorum,
            min_quorum: config.min_quorum,
            bootstrap_threshold: config.bootstrap_threshold,
            bootstrap_quorum: config.bootstrap_quorum,
            allow_single_signer_bootstrap: config.allow_single_signer_bootstrap,
        }
    }

    /// Bootstrap mode applies while the network is too small for a normal
    /// quorum.
    pub fn is_bootstrap(&self, known_peer_count: usize) -> bool {
        known_peer_count < self.bootstrap_threshold
    }

    pub fn required_quorum(&self, bootstrap: bool) -> usize {
        if bootstrap {
            let floor = if self.allow_single_signer_bootstrap { 1 } else { 2 };
            self.bootstrap_quorum.max(floor)
        } else {
            self.quorum.max(self.min_quorum.max(QUORUM_FLOOR))
        }
    }
}
