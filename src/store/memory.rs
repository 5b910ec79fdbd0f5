use crate::core::cache::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-process cache store, lost when the process exits
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, CacheValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            // Check if entry has expired
            if let Some(expiry) = entry.expires_at {
                if expiry < Instant::now() {
                    debug!("Cache entry expired for key: {}", key);
                    cache.remove(key);
                    return None;
                }
            }
            debug!("Cache HIT for key: {}", key);
            return Some(entry.value.clone());
        }
        debug!("Cache MISS for key: {}", key);
        None
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(key.to_string(), CacheValue { value, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_store_get_set() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.get("key1").await.is_none());

        store.set("key1", b"123".to_vec(), None).await;
        assert_eq!(store.get("key1").await, Some(b"123".to_vec()));

        assert!(store.get("key2").await.is_none());
    }

    #[tokio::test]
    async fn test_store_overwrite_last_write_wins() {
        let store = MemoryStore::new();
        store.set("key1", b"a".to_vec(), None).await;
        store.set("key1", b"b".to_vec(), None).await;
        assert_eq!(store.get("key1").await, Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let store = MemoryStore::new();

        store
            .set("key1", b"123".to_vec(), Some(Duration::from_millis(10)))
            .await;
        assert_eq!(store.get("key1").await, Some(b"123".to_vec()));

        // Wait for TTL expiration
        sleep(Duration::from_millis(20)).await;
        assert!(store.get("key1").await.is_none());
    }
}
