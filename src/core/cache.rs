//! Byte-level cache store abstraction

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// Key-value storage used to avoid refetching identical requests.
///
/// Implementations never fail the caller: a broken read is a miss and a
/// broken write is dropped.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);
}

/// Reads and decodes a JSON value. Undecodable payloads count as a miss.
pub async fn get_json<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let bytes = store.get(key).await?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Discarding undecodable cache entry {}: {}", key, e);
            None
        }
    }
}

pub async fn put_json<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) {
    match serde_json::to_vec(value) {
        Ok(bytes) => store.set(key, bytes, ttl).await,
        Err(e) => debug!("Skipping cache write for {}: {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_json_round_trip_through_store() {
        let store = MemoryStore::new();
        put_json(&store, "k", &vec![1.5, 2.5], None).await;
        let value: Option<Vec<f64>> = get_json(&store, "k").await;
        assert_eq!(value, Some(vec![1.5, 2.5]));
    }

    #[tokio::test]
    async fn test_garbage_entry_is_a_miss() {
        let store = MemoryStore::new();
        store.set("k", b"not json".to_vec(), None).await;
        let value: Option<Vec<f64>> = get_json(&store, "k").await;
        assert!(value.is_none());
    }
}
