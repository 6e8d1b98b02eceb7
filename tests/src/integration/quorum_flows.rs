//! # Attestation Flows
//!
//! Peer registry, snapshot quorum and status selector wired over one shared
//! in-memory store, without the HTTP layer:
//!
//! 1. **Registry (01) → Quorum (02)**: the announcer count decides bootstrap mode
//! 2. **Quorum (02) → Selector (03)**: promoted snapshots become the signed status
//! 3. **Stats push → Selector (03)**: pushed stats compete with the signed height

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{peer, signer, snapshot, UnreachableProbe, T0};
    use cw_01_peer_registry::{PeerRegistry, RegistryConfig};
    use cw_02_snapshot_quorum::{QuorumConfig, SnapshotQuorumEngine};
    use cw_03_status_selector::{
        SelectorConfig, StatsRepository, StatusDependencies, StatusService, StatusSource,
    };
    use shared_crypto::TrustedKeys;
    use shared_store::MemoryStore;
    use shared_types::{ManualTimeSource, StatsSnapshot};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct World {
        clock: Arc<ManualTimeSource>,
        registry: Arc<PeerRegistry>,
        quorum: Arc<SnapshotQuorumEngine>,
        stats: Arc<StatsRepository>,
        status: StatusService,
    }

    impl World {
        fn new(trusted: &[String], quorum_config: QuorumConfig) -> Self {
            let clock = Arc::new(ManualTimeSource::at_secs(T0));
            let store = Arc::new(MemoryStore::with_time_source(clock.clone()));
            let selector = SelectorConfig::default();

            let registry = Arc::new(PeerRegistry::new(
                store.clone(),
                clock.clone(),
                RegistryConfig::default(),
            ));
            let quorum = Arc::new(SnapshotQuorumEngine::new(
                store.clone(),
                clock.clone(),
                Arc::new(TrustedKeys::new(trusted)),
                quorum_config,
            ));
            let stats = Arc::new(StatsRepository::new(
                store.clone(),
                selector.stats_ttl_secs,
                selector.stats_latest_ttl_secs,
            ));
            let status = StatusService::new(
                StatusDependencies {
                    registry: registry.clone(),
                    quorum: quorum.clone(),
                    stats: stats.clone(),
                    indexer: None,
                    probe: Arc::new(UnreachableProbe),
                    clock: clock.clone(),
                },
                selector,
            );

            Self {
                clock,
                registry,
                quorum,
                stats,
                status,
            }
        }

        async fn known_peers(&self) -> usize {
            self.registry.list_deduped().await.unwrap().len()
        }

        /// Move past the status cache and any sticky source.
        fn settle(&self) {
            self.clock.advance_secs(30);
        }
    }

    fn pushed(height: u64, received_at: u64) -> StatsSnapshot {
        StatsSnapshot {
            node_id: "pusher".into(),
            public_key: "pk".into(),
            height,
            difficulty: 3.0,
            hashrate_ths: 40.0,
            last_block_time: received_at,
            peers: 8,
            version: "1.0.0".into(),
            uptime_secs: 60,
            received_at,
            signature: "sig".into(),
        }
    }

    // =============================================================================
    // BOOTSTRAP MODE
    // =============================================================================

    #[tokio::test]
    async fn test_single_signer_bootstrap_promotes_immediately() {
        let a = signer(1).public_key_hex();
        let world = World::new(
            &[a.clone()],
            QuorumConfig {
                bootstrap_quorum: 1,
                allow_single_signer_bootstrap: true,
                ..QuorumConfig::default()
            },
        );

        let outcome = world
            .quorum
            .submit(snapshot(100, "node-a", &a, T0), &a, world.known_peers().await)
            .await
            .unwrap();
        assert!(outcome.bootstrap);
        assert_eq!(outcome.required_quorum, 1);
        assert!(outcome.promoted);

        let status = world.status.status().await;
        assert_eq!(status.source, StatusSource::Snapshot);
        assert!(status.verified);
        assert_eq!(status.verify_reason, "signed_snapshot_available");
        assert_eq!(status.snapshot.map(|s| s.height), Some(100));
        assert!(status.diagnostics.has_snapshot);
    }

    // =============================================================================
    // ESTABLISHED NETWORK
    // =============================================================================

    #[tokio::test]
    async fn test_established_network_needs_full_quorum() {
        let a = signer(2).public_key_hex();
        let b = signer(3).public_key_hex();
        let world = World::new(
            &[a.clone(), b.clone()],
            QuorumConfig {
                bootstrap_quorum: 1,
                allow_single_signer_bootstrap: true,
                ..QuorumConfig::default()
            },
        );

        world.registry.upsert(peer("p1", "8.8.8.8", 10, T0)).await.unwrap();
        world.registry.upsert(peer("p2", "9.9.9.9", 10, T0)).await.unwrap();
        assert_eq!(world.known_peers().await, 2);

        let first = world
            .quorum
            .submit(snapshot(100, "node-a", &a, T0), &a, world.known_peers().await)
            .await
            .unwrap();
        assert!(!first.bootstrap);
        assert_eq!(first.required_quorum, 2);
        assert!(!first.verified);

        let waiting = world.status.status().await;
        assert_eq!(waiting.source, StatusSource::Pending);
        assert!(!waiting.verified);
        assert_eq!(waiting.verify_reason, "awaiting_signed_snapshot_quorum");
        assert_eq!(waiting.peers, 2);
        assert!(waiting.diagnostics.has_pending);

        let second = world
            .quorum
            .submit(snapshot(100, "node-b", &b, T0), &b, world.known_peers().await)
            .await
            .unwrap();
        assert!(second.promoted);
        assert_eq!(second.quorum, 2);

        world.settle();
        let settled = world.status.status().await;
        assert_eq!(settled.source, StatusSource::Snapshot);
        assert!(settled.verified);
        assert_eq!(world.quorum.history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_untrusted_signer_never_advances() {
        let trusted = signer(4).public_key_hex();
        let outsider = signer(5).public_key_hex();
        let world = World::new(&[trusted], QuorumConfig::default());

        for _ in 0..3 {
            let outcome = world
                .quorum
                .submit(snapshot(50, "x", &outsider, T0), &outsider, 0)
                .await
                .unwrap();
            assert_eq!(outcome.quorum, 0);
            assert!(!outcome.verified);
        }
        assert!(world.quorum.canonical().await.unwrap().is_none());
    }

    // =============================================================================
    // PUSHED STATS AGAINST SIGNED STATE
    // =============================================================================

    #[tokio::test]
    async fn test_push_just_ahead_of_snapshot_wins() {
        let a = signer(6).public_key_hex();
        let world = World::new(
            &[a.clone()],
            QuorumConfig {
                bootstrap_quorum: 1,
                allow_single_signer_bootstrap: true,
                ..QuorumConfig::default()
            },
        );
        world
            .quorum
            .submit(snapshot(100, "node-a", &a, T0), &a, 0)
            .await
            .unwrap();
        world.stats.save(&pushed(101, T0)).await.unwrap();

        let status = world.status.status().await;
        assert_eq!(status.source, StatusSource::Push);
        assert!(status.verified);
        assert_eq!(status.stats.map(|s| s.height), Some(101));
        assert_eq!(status.peers, 8);
    }

    #[tokio::test]
    async fn test_push_far_ahead_of_snapshot_discarded() {
        let a = signer(7).public_key_hex();
        let world = World::new(
            &[a.clone()],
            QuorumConfig {
                bootstrap_quorum: 1,
                allow_single_signer_bootstrap: true,
                ..QuorumConfig::default()
            },
        );
        world
            .quorum
            .submit(snapshot(100, "node-a", &a, T0), &a, 0)
            .await
            .unwrap();
        world.stats.save(&pushed(140, T0)).await.unwrap();

        let status = world.status.status().await;
        assert_eq!(status.source, StatusSource::Snapshot);
        assert!(status.diagnostics.has_pushed_stats);
    }
}
