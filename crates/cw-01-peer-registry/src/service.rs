use crate::config::RegistryConfig;
use crate::domain::{dedupe_by_endpoint, rank, RegistryError};
use shared_store::{keys, KvStore, KvStoreExt};
use shared_types::{PeerRecord, TimeSource};
use std::sync::Arc;
use tracing::{debug, info};

/// Peer registry service.
///
/// Persists one [`PeerRecord`] per `node_id` and serves the live set.
/// Concurrent announces for the same node are last-write-wins.
pub struct PeerRegistry {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn TimeSource>,
    config: RegistryConfig,
}

impl PeerRegistry {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn TimeSource>, config: RegistryConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Insert or refresh a node's record.
    ///
    /// `first_seen` is carried over from the previous record and
    /// `seen_count` is incremented; the TTL restarts.
    pub async fn upsert(&self, mut record: PeerRecord) -> Result<PeerRecord, RegistryError> {
        record.validate()?;

        let key = keys::peer(&record.node_id);
        let existing: Option<PeerRecord> = self.store.get_json(&key).await?;

        let (first_seen, seen_count) = match &existing {
            Some(prev) => (prev.first_seen_or_last(), prev.seen_count.unwrap_or(0) + 1),
            None => (record.last_seen, 1),
        };
        record.first_seen = Some(first_seen);
        record.seen_count = Some(seen_count);

        let ttl = self.config.peer_ttl_secs;
        self.store.set_json(&key, &record, Some(ttl)).await?;
        self.store
            .sadd(keys::PEER_INDEX, std::slice::from_ref(&key))
            .await?;
        self.store.expire(keys::PEER_INDEX, ttl).await?;

        if existing.is_none() {
            info!(node_id = %record.node_id, endpoint = %record.endpoint(), "new peer announced");
        } else {
            debug!(node_id = %record.node_id, seen_count, height = record.height, "peer refreshed");
        }
        Ok(record)
    }

    /// All live records.
    ///
    /// Index members whose record has expired are pruned; records silent for
    /// longer than the TTL are skipped even if the store still holds them.
    pub async fn list(&self) -> Result<Vec<PeerRecord>, RegistryError> {
        let index = self.store.smembers(keys::PEER_INDEX).await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Option<PeerRecord>> = self.store.mget_json(&index).await?;
        let stale: Vec<String> = index
            .iter()
            .zip(&records)
            .filter(|(_, r)| r.is_none())
            .map(|(k, _)| k.clone())
            .collect();
        if !stale.is_empty() {
            debug!(count = stale.len(), "pruning stale peer index entries");
            self.store.srem(keys::PEER_INDEX, &stale).await?;
        }

        let now = self.clock.now_secs();
        let ttl = self.config.peer_ttl_secs;
        Ok(records
            .into_iter()
            .flatten()
            .filter(|p| now.saturating_sub(p.last_seen) <= ttl)
            .map(|mut p| {
                p.first_seen = Some(p.first_seen_or_last());
                p.seen_count = Some(p.seen_count_or_one());
                p
            })
            .collect())
    }

    /// Live records collapsed to one per endpoint.
    pub async fn list_deduped(&self) -> Result<Vec<PeerRecord>, RegistryError> {
        Ok(dedupe_by_endpoint(self.list().await?))
    }

    /// Deduplicated, ranked, truncated to `limit`.
    pub async fn list_ranked(&self, limit: usize) -> Result<Vec<PeerRecord>, RegistryError> {
        let now = self.clock.now_secs();
        let mut ranked = rank(self.list_deduped().await?, now);
        ranked.truncate(limit);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::MemoryStore;
    use shared_types::ManualTimeSource;

    const T0: u64 = 1_700_000_000;

    fn setup() -> (Arc<ManualTimeSource>, Arc<MemoryStore>, PeerRegistry) {
        let clock = Arc::new(ManualTimeSource::at_secs(T0));
        let store = Arc::new(MemoryStore::with_time_source(clock.clone()));
        let registry = PeerRegistry::new(store.clone(), clock.clone(), RegistryConfig::default());
        (clock, store, registry)
    }

    fn announce(node: &str, ip: &str, height: u64, last_seen: u64) -> PeerRecord {
        PeerRecord {
            ip: ip.into(),
            port: 9000,
            node_id: node.into(),
            version: "1.0".into(),
            height,
            last_seen,
            first_seen: None,
            seen_count: None,
            stats_port: None,
            latency_ms: Some(20.0),
            signature: "sig".into(),
        }
    }

    #[tokio::test]
    async fn test_upsert_tracks_history() {
        let (clock, _store, registry) = setup();

        let first = registry.upsert(announce("n1", "8.8.8.8", 10, T0)).await.unwrap();
        assert_eq!(first.first_seen, Some(T0));
        assert_eq!(first.seen_count, Some(1));

        clock.advance_secs(60);
        let second = registry
            .upsert(announce("n1", "8.8.8.8", 11, T0 + 60))
            .await
            .unwrap();
        assert_eq!(second.first_seen, Some(T0));
        assert_eq!(second.seen_count, Some(2));

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].height, 11);
    }

    #[tokio::test]
    async fn test_invalid_port_rejected() {
        let (_clock, _store, registry) = setup();
        let mut rec = announce("n1", "8.8.8.8", 1, T0);
        rec.port = 0;
        assert!(matches!(
            registry.upsert(rec).await,
            Err(RegistryError::InvalidRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_records_pruned() {
        let (clock, store, registry) = setup();
        registry.upsert(announce("old", "8.8.8.8", 1, T0)).await.unwrap();
        clock.advance_secs(1000);
        registry
            .upsert(announce("new", "9.9.9.9", 1, T0 + 1000))
            .await
            .unwrap();

        clock.advance_secs(1000);
        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].node_id, "new");

        let index = store.smembers(keys::PEER_INDEX).await.unwrap();
        assert_eq!(index, vec![keys::peer("new")]);
    }

    #[tokio::test]
    async fn test_silent_peer_skipped_before_store_expiry() {
        let (clock, _store, registry) = setup();
        // Announced with an old timestamp: the store still holds it, but it
        // is already past the TTL relative to `last_seen`.
        registry
            .upsert(announce("lagging", "8.8.8.8", 1, T0 - 1700))
            .await
            .unwrap();
        clock.advance_secs(200);
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_ranked_dedupes_and_limits() {
        let (_clock, _store, registry) = setup();
        registry.upsert(announce("a", "8.8.8.8", 100, T0 - 5)).await.unwrap();
        registry.upsert(announce("b", "8.8.8.8", 100, T0)).await.unwrap();
        registry.upsert(announce("c", "9.9.9.9", 900, T0)).await.unwrap();
        registry.upsert(announce("d", "1.1.1.1", 1, T0)).await.unwrap();

        let ranked = registry.list_ranked(2).await.unwrap();
        let ids: Vec<&str> = ranked.iter().map(|p| p.node_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
