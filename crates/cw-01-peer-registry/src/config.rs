//! Registry configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seconds of silence after which a peer is treated as gone.
    pub peer_ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { peer_ttl_secs: 1800 }
    }
}
