//! Key-value store trait.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{StorageError, StorageResult};

/// Durable key-value storage owned by a single actor.
///
/// Implementations need not provide cross-key atomicity; the owning actor
/// serializes every read-modify-write.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Replace the document stored under `key`.
    ///
    /// Must be atomic - either fully succeeds or has no effect.
    async fn put(&self, key: &str, value: Value) -> StorageResult<()>;
}

/// Read and decode the document under `key`.
pub async fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StorageResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::malformed(key, e.to_string())),
        None => Ok(None),
    }
}

/// Encode `value` and store it under `key`.
pub async fn save<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> StorageResult<()> {
    let value =
        serde_json::to_value(value).map_err(|e| StorageError::serialization(e.to_string()))?;
    store.put(key, value).await
}
