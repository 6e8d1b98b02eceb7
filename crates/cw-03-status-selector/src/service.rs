//! # Status Service
//!
//! Long-lived owner of the memoized status, the single-flight guard and the
//! sticky selection. Construct once and share behind an `Arc`.

use crate::config::SelectorConfig;
use crate::domain::{
    announce_candidate, reconcile_peer_count, select, Candidate, Diagnostics, SelectorError,
    StatusPayload, StatusSource, StickySelection, TelemetryStats,
};
use crate::ports::{IndexerClient, StatsProbe};
use crate::probe::{PeerProber, ProbeSettings};
use crate::repository::StatsRepository;
use cw_01_peer_registry::PeerRegistry;
use cw_02_snapshot_quorum::SnapshotQuorumEngine;
use cw_telemetry::{STATUS_CACHE, STATUS_SELECTIONS};
use parking_lot::{Mutex, RwLock};
use shared_types::TimeSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Collaborators the status read pulls from.
pub struct StatusDependencies {
    pub registry: Arc<PeerRegistry>,
    pub quorum: Arc<SnapshotQuorumEngine>,
    pub stats: Arc<StatsRepository>,
    pub indexer: Option<Arc<dyn IndexerClient>>,
    pub probe: Arc<dyn StatsProbe>,
    pub clock: Arc<dyn TimeSource>,
}

#[derive(Debug, Clone)]
struct CachedStatus {
    expires_at_ms: u64,
    payload: StatusPayload,
}

pub struct StatusService {
    registry: Arc<PeerRegistry>,
    quorum: Arc<SnapshotQuorumEngine>,
    stats: Arc<StatsRepository>,
    indexer: Option<Arc<dyn IndexerClient>>,
    prober: PeerProber,
    clock: Arc<dyn TimeSource>,
    config: SelectorConfig,
    cache: RwLock<Option<CachedStatus>>,
    /// Held for the duration of a recomputation.
    inflight: tokio::sync::Mutex<()>,
    sticky: Mutex<Option<StickySelection>>,
    computations: AtomicU64,
}

impl StatusService {
    pub fn new(deps: StatusDependencies, config: SelectorConfig) -> Self {
        let prober = PeerProber::new(deps.probe, ProbeSettings::from(&config));
        Self {
            registry: deps.registry,
            quorum: deps.quorum,
            stats: deps.stats,
            indexer: deps.indexer,
            prober,
            clock: deps.clock,
            config,
            cache: RwLock::new(None),
            inflight: tokio::sync::Mutex::new(()),
            sticky: Mutex::new(None),
            computations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn stats_repository(&self) -> &Arc<StatsRepository> {
        &self.stats
    }

    /// How many times the status has been recomputed.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn sticky_selection(&self) -> Option<StickySelection> {
        *self.sticky.lock()
    }

    fn cached(&self) -> Option<StatusPayload> {
        let now_ms = self.clock.now_millis();
        self.cache
            .read()
            .as_ref()
            .filter(|c| now_ms < c.expires_at_ms)
            .map(|c| c.payload.clone())
    }

    /// Current chain status. Upstream failures only remove candidates; this
    /// never fails.
    pub async fn status(&self) -> StatusPayload {
        if let Some(hit) = self.cached() {
            STATUS_CACHE.with_label_values(&["hit"]).inc();
            return hit;
        }

        let _flight = self.inflight.lock().await;
        if let Some(hit) = self.cached() {
            STATUS_CACHE.with_label_values(&["coalesced"]).inc();
            return hit;
        }
        STATUS_CACHE.with_label_values(&["miss"]).inc();

        let payload = self.compute().await;
        *self.cache.write() = Some(CachedStatus {
            expires_at_ms: self.clock.now_millis() + self.config.cache_ttl_ms,
            payload: payload.clone(),
        });
        payload
    }

    async fn compute(&self) -> StatusPayload {
        self.computations.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_secs();

        let (canonical, pending, peers, indexer, pushed) = tokio::join!(
            self.quorum.canonical(),
            self.quorum.pending(),
            self.registry.list_deduped(),
            self.fetch_indexer(),
            self.pushed_stats(),
        );
        let canonical = absent_on_error("canonical snapshot", canonical).flatten();
        let pending = absent_on_error("pending snapshots", pending).unwrap_or_default();
        let peers = absent_on_error("peer registry", peers).unwrap_or_default();

        let probed = self.prober.probe_best(&peers, now).await;
        let peer_candidate = probed
            .clone()
            .or_else(|| announce_candidate(&peers, now, self.config.stats_max_age_secs));

        let announce_peers = peers.len() as u64;
        let peer_count = reconcile_peer_count(
            announce_peers,
            [indexer.as_ref(), pushed.as_ref(), probed.as_ref()]
                .into_iter()
                .flatten(),
        );

        let diagnostics = Diagnostics {
            announce_peers,
            has_pushed_stats: pushed.is_some(),
            has_peer_stats: probed.is_some(),
            has_snapshot: canonical.is_some(),
            has_pending: !pending.is_empty(),
        };

        let candidates: Vec<Candidate> = [
            indexer.map(|s| Candidate::new(StatusSource::Indexer, s)),
            pushed.map(|s| Candidate::new(StatusSource::Push, s)),
            peer_candidate.map(|s| Candidate::new(StatusSource::Peer, s)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let sticky = self.sticky_selection();
        let selection = select(
            candidates,
            canonical.as_ref(),
            pending.first(),
            sticky.as_ref(),
            now,
            &self.config.rules(),
        );
        *self.sticky.lock() = Some(selection.sticky);

        STATUS_SELECTIONS
            .with_label_values(&[selection.source.as_str()])
            .inc();
        debug!(
            source = %selection.source,
            height = selection.sticky.height,
            verified = selection.verified,
            "status selected"
        );

        StatusPayload::from_selection(selection, peer_count, diagnostics)
    }

    async fn fetch_indexer(&self) -> Option<TelemetryStats> {
        let indexer = self.indexer.as_ref()?;
        match indexer.fetch().await {
            Ok(body) => {
                let stats = TelemetryStats::from_json(&body);
                if stats.is_none() {
                    debug!("indexer stats malformed");
                }
                stats
            }
            Err(e) => {
                debug!(error = %e, "indexer unavailable");
                None
            }
        }
    }

    async fn pushed_stats(&self) -> Option<TelemetryStats> {
        if !self.config.push_stats_enabled {
            return None;
        }
        let best = self.stats.select_best(self.config.push_stats_max_lag).await;
        absent_on_error("pushed stats", best)
            .flatten()
            .map(|s| TelemetryStats::from(&s))
    }
}

fn absent_on_error<T, E>(what: &str, result: Result<T, E>) -> Option<T>
where
    E: Into<SelectorError>,
{
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let e: SelectorError = e.into();
            warn!(source = what, error = %e, "status input unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cw_01_peer_registry::RegistryConfig;
    use cw_02_snapshot_quorum::QuorumConfig;
    use serde_json::{json, Value};
    use shared_crypto::TrustedKeys;
    use shared_store::{keys, KvStore, KvStoreExt, MemoryStore};
    use shared_types::{HeaderEntry, HeaderSnapshot, ManualTimeSource, StatsSnapshot};
    use std::net::Ipv4Addr;
    use std::sync::atomic::AtomicUsize;

    const T0: u64 = 1_700_000_000;

    struct FakeIndexer {
        body: parking_lot::Mutex<Option<Value>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexerClient for FakeIndexer {
        async fn fetch(&self) -> Result<Value, SelectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.body
                .lock()
                .clone()
                .ok_or_else(|| SelectorError::Upstream("down".into()))
        }
    }

    struct NoProbe;

    #[async_trait]
    impl StatsProbe for NoProbe {
        async fn probe(&self, _ip: Ipv4Addr, _port: u16) -> Result<Value, SelectorError> {
            Err(SelectorError::Timeout)
        }
    }

    struct Harness {
        clock: Arc<ManualTimeSource>,
        store: Arc<MemoryStore>,
        indexer: Arc<FakeIndexer>,
        registry: Arc<PeerRegistry>,
        stats: Arc<StatsRepository>,
        service: StatusService,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualTimeSource::at_secs(T0));
        let store = Arc::new(MemoryStore::with_time_source(clock.clone()));
        let config = SelectorConfig::default();
        let registry = Arc::new(PeerRegistry::new(
            store.clone(),
            clock.clone(),
            RegistryConfig::default(),
        ));
        let quorum = Arc::new(SnapshotQuorumEngine::new(
            store.clone(),
            clock.clone(),
            Arc::new(TrustedKeys::default()),
            QuorumConfig::default(),
        ));
        let stats = Arc::new(StatsRepository::new(
            store.clone(),
            config.stats_ttl_secs,
            config.stats_latest_ttl_secs,
        ));
        let indexer = Arc::new(FakeIndexer {
            body: parking_lot::Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        let service = StatusService::new(
            StatusDependencies {
                registry: registry.clone(),
                quorum,
                stats: stats.clone(),
                indexer: Some(indexer.clone()),
                probe: Arc::new(NoProbe),
                clock: clock.clone(),
            },
            config,
        );
        Harness {
            clock,
            store,
            indexer,
            registry,
            stats,
            service,
        }
    }

    fn canonical(height: u64, received_at: u64) -> HeaderSnapshot {
        HeaderSnapshot {
            height,
            network_id: None,
            last_block_time: received_at,
            difficulty: Some(2.0),
            hashrate_ths: Some(1.5),
            headers: vec![HeaderEntry {
                height,
                hash: "tip".into(),
                prev_hash: "parent".into(),
                timestamp: received_at,
            }],
            node_id: "n".into(),
            public_key: "pk".into(),
            signature: "sig".into(),
            received_at,
        }
    }

    fn pushed(height: u64, received_at: u64) -> StatsSnapshot {
        StatsSnapshot {
            node_id: format!("node-{height}"),
            public_key: "pk".into(),
            height,
            difficulty: 1.0,
            hashrate_ths: 1.0,
            last_block_time: received_at,
            peers: 7,
            version: "1".into(),
            uptime_secs: 10,
            received_at,
            signature: "sig".into(),
        }
    }

    #[tokio::test]
    async fn test_lagging_indexer_loses_to_snapshot() {
        let h = harness();
        *h.indexer.body.lock() = Some(json!({"height": 100, "received_at": T0, "peers": 11}));
        h.store
            .set_json(keys::SNAPSHOT, &canonical(97, T0 - 500), Some(3600))
            .await
            .unwrap();

        let status = h.service.status().await;
        assert_eq!(status.source, StatusSource::Snapshot);
        assert!(status.verified);
        assert_eq!(status.verify_reason, "signed_snapshot_available");
        assert_eq!(status.stats.as_ref().unwrap().height, 97);
        assert_eq!(status.peers, 11);
        assert!(status.diagnostics.has_snapshot);
    }

    #[tokio::test]
    async fn test_concurrent_reads_compute_once() {
        let h = harness();
        *h.indexer.body.lock() = Some(json!({"height": 5, "received_at": T0}));

        let (a, b) = tokio::join!(h.service.status(), h.service.status());
        assert_eq!(a, b);
        assert_eq!(h.service.computations(), 1);
        assert_eq!(h.indexer.calls.load(Ordering::SeqCst), 1);

        h.clock.advance_millis(2_000);
        h.service.status().await;
        assert_eq!(h.service.computations(), 1);

        h.clock.advance_millis(1_500);
        h.service.status().await;
        assert_eq!(h.service.computations(), 2);
    }

    #[tokio::test]
    async fn test_sticky_source_survives_small_challenger() {
        let h = harness();
        *h.indexer.body.lock() = Some(json!({"height": 50, "received_at": T0}));
        assert_eq!(h.service.status().await.source, StatusSource::Indexer);

        h.clock.advance_secs(4);
        h.stats.save(&pushed(51, T0 + 4)).await.unwrap();
        let held = h.service.status().await;
        assert_eq!(held.source, StatusSource::Indexer);
        assert!(held.diagnostics.has_pushed_stats);

        h.clock.advance_secs(4);
        h.stats.save(&pushed(53, T0 + 8)).await.unwrap();
        let switched = h.service.status().await;
        assert_eq!(switched.source, StatusSource::Push);
        assert!(!switched.verified);
        assert_eq!(
            h.service.sticky_selection().map(|s| s.source),
            Some(StatusSource::Push)
        );
    }

    #[tokio::test]
    async fn test_announce_fallback_when_probes_fail() {
        let h = harness();
        h.registry
            .upsert(shared_types::PeerRecord {
                ip: "8.8.8.8".into(),
                port: 9000,
                node_id: "a".into(),
                version: "1".into(),
                height: 30,
                last_seen: T0 - 10,
                first_seen: None,
                seen_count: None,
                stats_port: None,
                latency_ms: None,
                signature: "s".into(),
            })
            .await
            .unwrap();

        let status = h.service.status().await;
        assert_eq!(status.source, StatusSource::Peer);
        assert_eq!(status.stats.as_ref().unwrap().height, 30);
        assert_eq!(status.peers, 1);
        assert!(!status.diagnostics.has_peer_stats);
        assert_eq!(status.last_updated, T0 - 10);
    }

    #[tokio::test]
    async fn test_empty_world_is_stale_pending() {
        let h = harness();
        let status = h.service.status().await;
        assert_eq!(status.source, StatusSource::Pending);
        assert_eq!(status.stale, Some(true));
        assert!(status.stats.is_none());
        assert_eq!(status.peers, 0);
        assert!(h.store.smembers(keys::PEER_INDEX).await.unwrap().is_empty());
    }
}
