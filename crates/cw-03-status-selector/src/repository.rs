//! Pushed stats persistence.

use crate::domain::SelectorError;
use shared_store::{keys, KvStore, KvStoreExt};
use shared_types::StatsSnapshot;
use std::sync::Arc;
use tracing::debug;

/// Signed stats pushed by nodes, one record per node plus a "latest" pointer.
pub struct StatsRepository {
    store: Arc<dyn KvStore>,
    ttl_secs: u64,
    latest_ttl_secs: u64,
}

impl StatsRepository {
    pub fn new(store: Arc<dyn KvStore>, ttl_secs: u64, latest_ttl_secs: u64) -> Self {
        Self {
            store,
            ttl_secs,
            latest_ttl_secs,
        }
    }

    pub async fn save(&self, stats: &StatsSnapshot) -> Result<(), SelectorError> {
        let key = keys::stats(&stats.node_id);
        self.store.set_json(&key, stats, Some(self.ttl_secs)).await?;
        self.store
            .sadd(keys::STATS_INDEX, std::slice::from_ref(&key))
            .await?;
        self.store.expire(keys::STATS_INDEX, self.ttl_secs).await?;
        self.store
            .set_json(keys::STATS_LATEST, stats, Some(self.latest_ttl_secs))
            .await?;
        debug!(node_id = %stats.node_id, height = stats.height, "stats stored");
        Ok(())
    }

    /// Most recently pushed stats from any node.
    pub async fn latest(&self) -> Result<Option<StatsSnapshot>, SelectorError> {
        Ok(self.store.get_json(keys::STATS_LATEST).await?)
    }

    /// Every live per-node record; dangling index members are pruned.
    pub async fn list(&self) -> Result<Vec<StatsSnapshot>, SelectorError> {
        let index = self.store.smembers(keys::STATS_INDEX).await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Option<StatsSnapshot>> = self.store.mget_json(&index).await?;
        let stale: Vec<String> = index
            .iter()
            .zip(&records)
            .filter(|(_, r)| r.is_none())
            .map(|(k, _)| k.clone())
            .collect();
        if !stale.is_empty() {
            self.store.srem(keys::STATS_INDEX, &stale).await?;
        }
        Ok(records.into_iter().flatten().collect())
    }

    /// Best pushed stats among `latest` and the index: only records within
    /// `max_lag` of the tallest are considered, then height, `last_block_time`
    /// and `received_at` decide.
    pub async fn select_best(&self, max_lag: u64) -> Result<Option<StatsSnapshot>, SelectorError> {
        let mut merged = self.list().await?;
        if let Some(latest) = self.latest().await? {
            merged.push(latest);
        }
        Ok(best_within_lag(merged, max_lag))
    }
}

fn best_within_lag(records: Vec<StatsSnapshot>, max_lag: u64) -> Option<StatsSnapshot> {
    let max_height = records.iter().map(|s| s.height).max()?;
    let min_height = max_height.saturating_sub(max_lag);
    records
        .into_iter()
        .filter(|s| s.height >= min_height)
        .max_by_key(|s| (s.height, s.last_block_time, s.received_at))
}
