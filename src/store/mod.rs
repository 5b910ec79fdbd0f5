pub mod disk;
pub mod memory;

use crate::core::cache::CacheStore;
use crate::core::config::{AppConfig, CacheBackend};
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the cache store selected in the config.
///
/// A disk store that cannot be opened falls back to running without a cache
/// rather than failing the command.
pub fn open_store(config: &AppConfig) -> Option<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::None => {
            debug!("Cache disabled by config");
            None
        }
        CacheBackend::Memory => Some(Arc::new(MemoryStore::new())),
        CacheBackend::Disk => {
            let opened = config
                .default_data_path()
                .and_then(|path| DiskStore::open(&path.join("cache")));
            match opened {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Could not open disk cache, continuing without it: {}", e);
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(backend: &str, data_path: &str) -> AppConfig {
        let yaml = format!("app_id: key\ndata_path: {data_path}\ncache:\n  backend: {backend}\n");
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_open_store_per_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(open_store(&config_with("none", path)).is_none());

        let memory = open_store(&config_with("memory", path)).unwrap();
        memory.set("k", b"v".to_vec(), None).await;
        assert_eq!(memory.get("k").await, Some(b"v".to_vec()));

        let disk = open_store(&config_with("disk", path)).unwrap();
        disk.set("k", b"v".to_vec(), None).await;
        assert_eq!(disk.get("k").await, Some(b"v".to_vec()));
        assert!(dir.path().join("cache").exists());
    }
}
