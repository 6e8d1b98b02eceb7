//! # Core Entities
//!
//! Record shapes persisted in the key-value store and exchanged between the
//! registry, the quorum engine and the status selector.
//!
//! All timestamps are whole seconds since the Unix epoch.

use crate::errors::EntityError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A 64-bit block height.
pub type Height = u64;

/// Seconds since the Unix epoch.
pub type UnixSecs = u64;

// =============================================================================
// PEERS
// =============================================================================

/// A node's most recent signed announcement.
///
/// Stored under `peer:<node_id>`; `first_seen` and `seen_count` are
/// maintained by the registry across refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub ip: String,
    pub port: u16,
    pub node_id: String,
    pub version: String,
    pub height: Height,
    pub last_seen: UnixSecs,
    /// Defaults to `last_seen` when an older record lacks it.
    #[serde(default)]
    pub first_seen: Option<UnixSecs>,
    #[serde(default)]
    pub seen_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    pub signature: String,
}

impl PeerRecord {
    /// `ip:port`, the identity used for deduplication.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn has_valid_port(&self) -> bool {
        self.port != 0
    }

    pub fn first_seen_or_last(&self) -> UnixSecs {
        self.first_seen.unwrap_or(self.last_seen)
    }

    pub fn seen_count_or_one(&self) -> u64 {
        self.seen_count.unwrap_or(1)
    }

    /// Port used to reach the node's `/stats` endpoint.
    pub fn stats_port_or(&self, default_port: u16) -> u16 {
        self.stats_port.filter(|p| *p != 0).unwrap_or(default_port)
    }

    pub fn validate(&self) -> Result<(), EntityError> {
        if self.node_id.is_empty() {
            return Err(EntityError::EmptyField("node_id"));
        }
        if self.ip.is_empty() {
            return Err(EntityError::EmptyField("ip"));
        }
        if !self.has_valid_port() {
            return Err(EntityError::InvalidPort(self.port));
        }
        Ok(())
    }
}

// =============================================================================
// HEADER SNAPSHOTS
// =============================================================================

/// One block header in a submitted chain segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub height: Height,
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: UnixSecs,
}

/// A signed chain segment reported by one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    pub height: Height,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub last_block_time: UnixSecs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashrate_ths: Option<f64>,
    pub headers: Vec<HeaderEntry>,
    pub node_id: String,
    pub public_key: String,
    pub signature: String,
    pub received_at: UnixSecs,
}

impl HeaderSnapshot {
    /// Hash of the last header in the segment.
    pub fn tip_hash(&self) -> Option<&str> {
        self.headers.last().map(|h| h.hash.as_str())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.network_id.as_deref(), self.height, self.tip_hash())
    }

    pub fn validate(&self) -> Result<(), EntityError> {
        if self.headers.is_empty() {
            return Err(EntityError::EmptyHeaders {
                height: self.height,
            });
        }
        if self.node_id.is_empty() {
            return Err(EntityError::EmptyField("node_id"));
        }
        Ok(())
    }
}

/// Identity of a snapshot for quorum counting:
/// `<network_id|"unknown">:<height>:<tip hash|"none">`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(network_id: Option<&str>, height: Height, tip_hash: Option<&str>) -> Self {
        Self(format!(
            "{}:{}:{}",
            network_id.unwrap_or("unknown"),
            height,
            tip_hash.unwrap_or("none")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A snapshot accumulating signer attestations inside the quorum window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub fingerprint: Fingerprint,
    pub snapshot: HeaderSnapshot,
    /// Public keys that have signed this fingerprint.
    pub signers: BTreeSet<String>,
    pub received_at: UnixSecs,
    /// Set once the snapshot has been written as canonical.
    #[serde(default)]
    pub promoted: bool,
}

impl PendingSnapshot {
    pub fn new(snapshot: HeaderSnapshot, received_at: UnixSecs) -> Self {
        Self {
            fingerprint: snapshot.fingerprint(),
            snapshot,
            signers: BTreeSet::new(),
            received_at,
            promoted: false,
        }
    }

    /// Number of signers that appear in `trusted`.
    pub fn trusted_signer_count<F>(&self, is_trusted: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        self.signers.iter().filter(|s| is_trusted(s)).count()
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Signed node telemetry pushed to `/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub node_id: String,
    pub public_key: String,
    pub height: Height,
    pub difficulty: f64,
    pub hashrate_ths: f64,
    pub last_block_time: UnixSecs,
    pub peers: u64,
    pub version: String,
    pub uptime_secs: u64,
    pub received_at: UnixSecs,
    pub signature: String,
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// Signed pointer to the latest published bootstrap archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapPointer {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Height>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_sig: Option<String>,
    pub updated_at: UnixSecs,
}
