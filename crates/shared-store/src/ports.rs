//! # Storage Port
//!
//! Abstract interface for the key-value collaborator.
//!
//! Production: any backend with Redis-like semantics.
//! Testing and single-instance deployments: [`crate::MemoryStore`].

use crate::errors::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Key-value operations with per-key TTL.
///
/// Expired keys behave exactly like absent keys.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store a value, replacing any previous one. `ttl_secs = None` keeps it
    /// until deleted.
    async fn set(&self, key: &str, value: Value, ttl_secs: Option<u64>) -> Result<(), StoreError>;

    /// Delete a key of any kind.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Increment an integer counter, creating it at 1. Does not touch the TTL.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Set a TTL on an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, StoreError>;

    /// Add members to a string set.
    async fn sadd(&self, key: &str, members: &[String]) -> Result<(), StoreError>;

    /// Remove members from a string set.
    async fn srem(&self, key: &str, members: &[String]) -> Result<(), StoreError>;

    /// All members of a string set (empty if absent).
    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Values for several keys, positionally aligned with `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError>;
}

/// Typed JSON helpers over any [`KvStore`].
#[async_trait]
pub trait KvStoreExt: KvStore {
    async fn get_json<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send;

    async fn set_json<T>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<(), StoreError>
    where
        T: Serialize + Sync;

    /// Like [`KvStore::mget`] but decoded; undecodable entries become `None`.
    async fn mget_json<T>(&self, keys: &[String]) -> Result<Vec<Option<T>>, StoreError>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStoreExt for S {
    async fn get_json<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set_json<T>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<(), StoreError>
    where
        T: Serialize + Sync,
    {
        let encoded = serde_json::to_value(value).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set(key, encoded, ttl_secs).await
    }

    async fn mget_json<T>(&self, keys: &[String]) -> Result<Vec<Option<T>>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        let values = self.mget(keys).await?;
        Ok(values
            .into_iter()
            .zip(keys)
            .map(|(value, key)| {
                value.and_then(|v| match serde_json::from_value(v) {
                    Ok(decoded) => Some(decoded),
                    Err(e) => {
                        warn!(key = %key, error = %e, "dropping undecodable record");
                        None
                    }
                })
            })
            .collect())
    }
}
