//! Shared test fixtures.

use async_trait::async_trait;
use cw_03_status_selector::{SelectorError, StatsProbe};
use serde_json::Value;
use shared_crypto::Ed25519KeyPair;
use shared_types::{HeaderEntry, HeaderSnapshot, PeerRecord};
use std::net::Ipv4Addr;

pub const T0: u64 = 1_700_000_000;

/// Probe for a network where no node exposes a stats endpoint.
pub struct UnreachableProbe;

#[async_trait]
impl StatsProbe for UnreachableProbe {
    async fn probe(&self, _ip: Ipv4Addr, _port: u16) -> Result<Value, SelectorError> {
        Err(SelectorError::Upstream("connection refused".into()))
    }
}

pub fn signer(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// Linked segment of `len` headers ending at `tip`.
pub fn segment(tip: u64, len: u64) -> Vec<HeaderEntry> {
    (tip + 1 - len..=tip)
        .map(|h| HeaderEntry {
            height: h,
            hash: format!("hash-{h}"),
            prev_hash: format!("hash-{}", h - 1),
            timestamp: T0 - 1_000 + h,
        })
        .collect()
}

pub fn snapshot(tip: u64, node_id: &str, public_key: &str, received_at: u64) -> HeaderSnapshot {
    HeaderSnapshot {
        height: tip,
        network_id: Some("main".into()),
        last_block_time: T0,
        difficulty: Some(2.0),
        hashrate_ths: None,
        headers: segment(tip, 4),
        node_id: node_id.into(),
        public_key: public_key.into(),
        signature: "checked-at-the-edge".into(),
        received_at,
    }
}

pub fn peer(node_id: &str, ip: &str, height: u64, last_seen: u64) -> PeerRecord {
    PeerRecord {
        ip: ip.into(),
        port: 9000,
        node_id: node_id.into(),
        version: "1.0.0".into(),
        height,
        last_seen,
        first_seen: None,
        seen_count: None,
        stats_port: None,
        latency_ms: None,
        signature: "sig".into(),
    }
}
