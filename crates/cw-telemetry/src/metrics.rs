//! Prometheus metrics for the gateway.
//!
//! All metrics follow the naming convention: `cw_<area>_<metric>_total`.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INGEST
    // =========================================================================

    /// Announcements by outcome (accepted or an error code)
    pub static ref ANNOUNCEMENTS: CounterVec = CounterVec::new(
        Opts::new("cw_announce_total", "Peer announcements by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Header snapshot submissions by outcome
    pub static ref HEADER_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("cw_header_submissions_total", "Header snapshot submissions by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Pushed stats submissions by outcome
    pub static ref STATS_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("cw_stats_submissions_total", "Pushed stats submissions by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Snapshots promoted to canonical
    pub static ref QUORUM_PROMOTIONS: Counter = Counter::new(
        "cw_quorum_promotions_total",
        "Header snapshots promoted to canonical after reaching quorum"
    ).expect("metric creation failed");

    /// Requests rejected by the rate limiter
    pub static ref RATE_LIMITED: CounterVec = CounterVec::new(
        Opts::new("cw_rate_limited_total", "Requests rejected by the rate limiter"),
        &["scope"]
    ).expect("metric creation failed");

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Peer `/stats` probes by outcome (ok, timeout, error, invalid)
    pub static ref PEER_PROBES: CounterVec = CounterVec::new(
        Opts::new("cw_peer_probes_total", "Peer stats probes by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Chain status selections by winning source
    pub static ref STATUS_SELECTIONS: CounterVec = CounterVec::new(
        Opts::new("cw_status_selections_total", "Chain status selections by source"),
        &["source"]
    ).expect("metric creation failed");

    /// Status cache lookups (hit, miss, coalesced)
    pub static ref STATUS_CACHE: CounterVec = CounterVec::new(
        Opts::new("cw_status_cache_total", "Chain status cache lookups"),
        &["result"]
    ).expect("metric creation failed");
}

/// Metrics handle
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling it twice is harmless: already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ANNOUNCEMENTS.clone()),
        Box::new(HEADER_SUBMISSIONS.clone()),
        Box::new(STATS_SUBMISSIONS.clone()),
        Box::new(QUORUM_PROMOTIONS.clone()),
        Box::new(RATE_LIMITED.clone()),
        Box::new(PEER_PROBES.clone()),
        Box::new(STATUS_SELECTIONS.clone()),
        Box::new(STATUS_CACHE.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
