//! # Snapshot Quorum Engine
//!
//! State machine per fingerprint:
//!
//! ```text
//! (absent) --submit--> pending --trusted signers >= required--> promoted
//!     ^                   |                                        |
//!     +---- window TTL ---+----------------------------------------+
//! ```
//!
//! Promotion writes the snapshot as canonical and pushes it onto the
//! history ring exactly once; later submissions for a promoted fingerprint
//! only record the signer.

use crate::config::QuorumConfig;
use crate::domain::{header_chain, QuorumError, QuorumOutcome, QuorumPolicy};
use cw_telemetry::QUORUM_PROMOTIONS;
use shared_crypto::TrustedKeys;
use shared_store::{keys, KvStore, KvStoreExt};
use shared_types::{HeaderSnapshot, PendingSnapshot, TimeSource};
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct SnapshotQuorumEngine {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn TimeSource>,
    trusted: Arc<TrustedKeys>,
    policy: QuorumPolicy,
    config: QuorumConfig,
    /// Serializes read-modify-write of pending records in this instance.
    submit_lock: Mutex<()>,
}

impl SnapshotQuorumEngine {
    pub fn new(
        store: Arc<dyn KvStore>,
        clock: Arc<dyn TimeSource>,
        trusted: Arc<TrustedKeys>,
        config: QuorumConfig,
    ) -> Self {
        Self {
            store,
            clock,
            trusted,
            policy: QuorumPolicy::from_config(&config),
            config,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    pub fn trusted_keys(&self) -> &TrustedKeys {
        &self.trusted
    }

    /// Record `signer`'s attestation of `snapshot` and promote it if the
    /// fingerprint now has enough trusted signers.
    ///
    /// `known_peer_count` is the deduplicated announcer count used to decide
    /// bootstrap mode.
    pub async fn submit(
        &self,
        snapshot: HeaderSnapshot,
        signer: &str,
        known_peer_count: usize,
    ) -> Result<QuorumOutcome, QuorumError> {
        snapshot.validate()?;
        header_chain::validate(&snapshot.headers)?;

        let bootstrap = self.policy.is_bootstrap(known_peer_count);
        let required_quorum = self.policy.required_quorum(bootstrap);
        let ttl = if bootstrap {
            self.config.bootstrap_pending_window_secs
        } else {
            self.config.quorum_window_secs
        };

        let fingerprint = snapshot.fingerprint();
        let pending_key = keys::pending(fingerprint.as_str());

        let _guard = self.submit_lock.lock().await;
        let now = self.clock.now_secs();

        let mut pending = match self.store.get_json::<PendingSnapshot>(&pending_key).await? {
            Some(mut existing) => {
                if !existing.promoted {
                    existing.snapshot = snapshot;
                }
                existing
            }
            None => PendingSnapshot::new(snapshot, now),
        };
        pending.received_at = now;
        pending.signers.insert(signer.to_string());

        let quorum = pending.trusted_signer_count(|k| self.trusted.contains(k));
        let verified = quorum >= required_quorum;
        let promoted = verified && !pending.promoted;

        if promoted {
            self.promote(&pending.snapshot).await?;
            pending.promoted = true;
            QUORUM_PROMOTIONS.inc();
            info!(
                fingerprint = %fingerprint,
                height = pending.snapshot.height,
                quorum,
                required_quorum,
                bootstrap,
                "snapshot promoted to canonical"
            );
        } else {
            debug!(
                fingerprint = %fingerprint,
                signers = pending.signers.len(),
                quorum,
                required_quorum,
                bootstrap,
                already_promoted = pending.promoted,
                "snapshot attestation recorded"
            );
        }

        self.store.set_json(&pending_key, &pending, Some(ttl)).await?;
        self.store
            .sadd(keys::PENDING_INDEX, std::slice::from_ref(&pending_key))
            .await?;

        Ok(QuorumOutcome {
            quorum,
            required_quorum,
            verified,
            bootstrap,
            promoted,
            fingerprint,
        })
    }

    async fn promote(&self, snapshot: &HeaderSnapshot) -> Result<(), QuorumError> {
        self.store
            .set_json(keys::SNAPSHOT, snapshot, Some(self.config.snapshot_ttl_secs))
            .await?;

        let mut history: Vec<HeaderSnapshot> =
            self.store.get_json(keys::HISTORY).await?.unwrap_or_default();
        history.insert(0, snapshot.clone());
        history.truncate(self.config.history_limit);
        self.store.set_json(keys::HISTORY, &history, None).await?;
        Ok(())
    }

    /// Current canonical snapshot.
    pub async fn canonical(&self) -> Result<Option<HeaderSnapshot>, QuorumError> {
        Ok(self.store.get_json(keys::SNAPSHOT).await?)
    }

    /// Promoted snapshots, newest first, at most `limit`.
    pub async fn history(&self, limit: usize) -> Result<Vec<HeaderSnapshot>, QuorumError> {
        let mut history: Vec<HeaderSnapshot> =
            self.store.get_json(keys::HISTORY).await?.unwrap_or_default();
        history.truncate(limit.min(self.config.history_limit));
        Ok(history)
    }

    pub fn history_limit(&self) -> usize {
        self.config.history_limit
    }

    /// Live pending records, highest first, most recent first at equal
    /// height. Index members whose record expired are pruned.
    pub async fn pending(&self) -> Result<Vec<PendingSnapshot>, QuorumError> {
        let index = self.store.smembers(keys::PENDING_INDEX).await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Option<PendingSnapshot>> = self.store.mget_json(&index).await?;
        let stale: Vec<String> = index
            .iter()
            .zip(&records)
            .filter(|(_, r)| r.is_none())
            .map(|(k, _)| k.clone())
            .collect();
        if !stale.is_empty() {
            self.store.srem(keys::PENDING_INDEX, &stale).await?;
        }

        let mut live: Vec<PendingSnapshot> = records.into_iter().flatten().collect();
        live.sort_by_key(|p| (Reverse(p.snapshot.height), Reverse(p.received_at)));
        Ok(live)
    }

    /// Highest pending record.
    pub async fn top_pending(&self) -> Result<Option<PendingSnapshot>, QuorumError> {
        Ok(self.pending().await?.into_iter().next())
    }
}
