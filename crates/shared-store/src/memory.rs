use crate::errors::StoreError;
use crate::ports::KvStore;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::{SystemTimeSource, TimeSource};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Slot {
    Json(Value),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    /// Absolute expiry in epoch milliseconds.
    expires_at_ms: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|at| now_ms >= at)
    }
}

/// In-memory key-value store.
///
/// Expired entries are dropped lazily on access and in bulk by
/// [`MemoryStore::purge_expired`].
pub struct MemoryStore {
    data: DashMap<String, Entry>,
    clock: Arc<dyn TimeSource>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            data: DashMap::new(),
            clock,
        }
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.data.len())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.data.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expiry(&self, ttl_secs: Option<u64>) -> Option<u64> {
        ttl_secs.map(|ttl| self.clock.now_millis().saturating_add(ttl.saturating_mul(1000)))
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let now = self.clock.now_millis();
        self.data.remove_if(key, |_, entry| entry.is_expired(now));
        self.data.get(key).map(|e| e.value().clone())
    }

    fn evict_if_expired(&self, key: &str) {
        let now = self.clock.now_millis();
        self.data.remove_if(key, |_, entry| entry.is_expired(now));
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.live(key) {
            Some(Entry {
                slot: Slot::Json(value),
                ..
            }) => Ok(Some(value)),
            Some(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_secs: Option<u64>) -> Result<(), StoreError> {
        self.data.insert(
            key.to_string(),
            Entry {
                slot: Slot::Json(value),
                expires_at_ms: self.expiry(ttl_secs),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.evict_if_expired(key);
        let mut entry = self.data.entry(key.to_string()).or_insert_with(|| Entry {
            slot: Slot::Json(Value::from(0i64)),
            expires_at_ms: None,
        });
        match &mut entry.slot {
            Slot::Json(value) => {
                let current = value.as_i64().ok_or_else(|| StoreError::WrongType {
                    key: key.to_string(),
                })?;
                let next = current.saturating_add(1);
                *value = Value::from(next);
                Ok(next)
            }
            Slot::Set(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        self.evict_if_expired(key);
        let at = self.expiry(Some(ttl_secs));
        match self.data.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at_ms = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.evict_if_expired(key);
        let mut entry = self.data.entry(key.to_string()).or_insert_with(|| Entry {
            slot: Slot::Set(BTreeSet::new()),
            expires_at_ms: None,
        });
        match &mut entry.slot {
            Slot::Set(set) => {
                set.extend(members.iter().cloned());
                Ok(())
            }
            Slot::Json(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        self.evict_if_expired(key);
        if let Some(mut entry) = self.data.get_mut(key) {
            match &mut entry.slot {
                Slot::Set(set) => {
                    for member in members {
                        set.remove(member);
                    }
                }
                Slot::Json(_) => {
                    return Err(StoreError::WrongType {
                        key: key.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.live(key) {
            Some(Entry {
                slot: Slot::Set(set),
                ..
            }) => Ok(set.into_iter().collect()),
            Some(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        Ok(keys
            .iter()
            .map(|key| match self.live(key) {
                Some(Entry {
                    slot: Slot::Json(value),
                    ..
                }) => Some(value),
                _ => None,
            })
            .collect())
    }
}
