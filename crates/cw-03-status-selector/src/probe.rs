//! # Peer Stats Probing
//!
//! Fan-out over the best-ranked announcers. Each probe runs as its own task
//! and reports through a channel; the collector stops listening after
//! enough well-formed answers, leaving the rest to finish or time out.

use crate::config::SelectorConfig;
use crate::domain::TelemetryStats;
use crate::ports::StatsProbe;
use cw_01_peer_registry::{is_probe_eligible, probe_target, rank};
use cw_telemetry::PEER_PROBES;
use shared_types::PeerRecord;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub enabled: bool,
    pub timeout: Duration,
    pub default_port: u16,
    pub max_lag: u64,
    pub max_attempts: usize,
    pub max_successes: usize,
    pub allow_private: bool,
}

impl From<&SelectorConfig> for ProbeSettings {
    fn from(config: &SelectorConfig) -> Self {
        Self {
            enabled: config.peer_stats_enabled,
            timeout: config.peer_stats_timeout(),
            default_port: config.peer_stats_port_default,
            max_lag: config.peer_stats_max_lag,
            max_attempts: config.peer_stats_max_attempts,
            max_successes: config.peer_stats_max_successes,
            allow_private: config.peer_stats_allow_private,
        }
    }
}

pub struct PeerProber {
    probe: Arc<dyn StatsProbe>,
    settings: ProbeSettings,
}

impl PeerProber {
    pub fn new(probe: Arc<dyn StatsProbe>, settings: ProbeSettings) -> Self {
        Self { probe, settings }
    }

    /// Endpoints worth probing, best first.
    pub fn targets(&self, peers: &[PeerRecord], now: u64) -> Vec<(Ipv4Addr, u16)> {
        let Some(max_height) = peers.iter().map(|p| p.height).max() else {
            return Vec::new();
        };
        let min_height = max_height.saturating_sub(self.settings.max_lag);

        let eligible: Vec<PeerRecord> = peers
            .iter()
            .filter(|p| p.height >= min_height)
            .filter(|p| is_probe_eligible(&p.ip, self.settings.allow_private))
            .cloned()
            .collect();

        rank(eligible, now)
            .into_iter()
            .filter_map(|p| {
                let ip = probe_target(&p.ip, self.settings.allow_private).ok()?;
                let port = p.stats_port_or(self.settings.default_port);
                (port > 0).then_some((ip, port))
            })
            .take(self.settings.max_attempts)
            .collect()
    }

    /// Probe the top targets and return the tallest answer (ties broken by
    /// `last_block_time`), or `None` when nothing usable came back.
    pub async fn probe_best(&self, peers: &[PeerRecord], now: u64) -> Option<TelemetryStats> {
        if !self.settings.enabled || self.settings.max_successes == 0 {
            return None;
        }
        let targets = self.targets(peers, now);
        if targets.is_empty() {
            return None;
        }

        let (tx, mut rx) = mpsc::channel(targets.len());
        for (ip, port) in targets {
            let probe = Arc::clone(&self.probe);
            let tx = tx.clone();
            let timeout = self.settings.timeout;
            tokio::spawn(async move {
                let result = match tokio::time::timeout(timeout, probe.probe(ip, port)).await {
                    Ok(Ok(body)) => match TelemetryStats::from_json(&body) {
                        Some(stats) => {
                            PEER_PROBES.with_label_values(&["success"]).inc();
                            Some(stats)
                        }
                        None => {
                            PEER_PROBES.with_label_values(&["malformed"]).inc();
                            debug!(%ip, port, "peer stats malformed");
                            None
                        }
                    },
                    Ok(Err(e)) => {
                        PEER_PROBES.with_label_values(&["failure"]).inc();
                        debug!(%ip, port, error = %e, "peer stats probe failed");
                        None
                    }
                    Err(_) => {
                        PEER_PROBES.with_label_values(&["timeout"]).inc();
                        debug!(%ip, port, "peer stats probe timed out");
                        None
                    }
                };
                // Receiver may already be gone after the cutoff.
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut successes = Vec::with_capacity(self.settings.max_successes);
        while let Some(result) = rx.recv().await {
            if let Some(stats) = result {
                successes.push(stats);
                if successes.len() >= self.settings.max_successes {
                    break;
                }
            }
        }

        successes
            .into_iter()
            .max_by_key(|s| (s.height, s.last_block_time))
    }
}
