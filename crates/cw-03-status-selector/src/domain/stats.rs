//! # Telemetry Candidates
//!
//! Every source is normalized to [`TelemetryStats`] before selection.
//! Indexer and probe payloads are untyped JSON, so numeric fields are read
//! leniently: numbers or numeric strings, non-finite values dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{HeaderSnapshot, StatsSnapshot};
use std::fmt;

/// Where a chain status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    Indexer,
    Push,
    Peer,
    Snapshot,
    Pending,
}

impl StatusSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indexer => "indexer",
            Self::Push => "push",
            Self::Peer => "peer",
            Self::Snapshot => "snapshot",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized chain telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryStats {
    pub height: u64,
    pub difficulty: f64,
    pub hashrate_ths: f64,
    pub last_block_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<u64>,
}

impl TelemetryStats {
    /// Parse an untyped payload. `height` is mandatory; everything else
    /// defaults to zero / absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let height = lenient_u64(value.get("height")?)?;
        Some(Self {
            height,
            difficulty: value.get("difficulty").and_then(lenient_f64).unwrap_or(0.0),
            hashrate_ths: value.get("hashrate_ths").and_then(lenient_f64).unwrap_or(0.0),
            last_block_time: value
                .get("last_block_time")
                .and_then(lenient_u64)
                .unwrap_or(0),
            peers: value.get("peers").and_then(lenient_u64),
            received_at: value
                .get("received_at")
                .and_then(lenient_u64)
                .filter(|t| *t > 0),
        })
    }

    /// When the candidate was observed: `received_at`, else
    /// `last_block_time`, else unknown.
    pub fn observed_at(&self) -> Option<u64> {
        self.received_at
            .filter(|t| *t > 0)
            .or(Some(self.last_block_time).filter(|t| *t > 0))
    }
}

impl From<&StatsSnapshot> for TelemetryStats {
    fn from(s: &StatsSnapshot) -> Self {
        Self {
            height: s.height,
            difficulty: finite_or_zero(s.difficulty),
            hashrate_ths: finite_or_zero(s.hashrate_ths),
            last_block_time: s.last_block_time,
            peers: Some(s.peers),
            received_at: Some(s.received_at).filter(|t| *t > 0),
        }
    }
}

impl From<&HeaderSnapshot> for TelemetryStats {
    fn from(s: &HeaderSnapshot) -> Self {
        Self {
            height: s.height,
            difficulty: s.difficulty.map(finite_or_zero).unwrap_or(0.0),
            hashrate_ths: s.hashrate_ths.map(finite_or_zero).unwrap_or(0.0),
            last_block_time: s.last_block_time,
            peers: None,
            received_at: None,
        }
    }
}

/// A network-sourced candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub source: StatusSource,
    pub stats: TelemetryStats,
}

impl Candidate {
    pub fn new(source: StatusSource, stats: TelemetryStats) -> Self {
        Self { source, stats }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn lenient_u64(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let v = lenient_f64(value)?;
    (v >= 0.0 && v <= u64::MAX as f64).then(|| v.trunc() as u64)
}
