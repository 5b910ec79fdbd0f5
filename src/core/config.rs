use crate::core::currency::{CurrencyCode, SymbolSet};
use crate::core::error::RatesError;
use crate::rates::client::ClientOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Disk,
    Memory,
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_latest_ttl_secs")]
    pub latest_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackend::default(),
            latest_ttl_secs: default_latest_ttl_secs(),
        }
    }
}

fn default_latest_ttl_secs() -> u64 {
    3600
}

fn default_base() -> String {
    "USD".to_string()
}

fn default_throttle_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub app_id: String,
    #[serde(default = "default_base")]
    pub base: String,
    pub symbols: Option<Vec<String>>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "oxrates", "oxrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "oxrates", "oxrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Validates the settings and turns them into client options.
    pub fn client_options(&self) -> Result<ClientOptions, RatesError> {
        if self.app_id.trim().is_empty() {
            return Err(RatesError::Config("app_id must be defined".to_string()));
        }

        let symbols = match &self.symbols {
            Some(list) if !list.is_empty() => Some(SymbolSet::new(list)?),
            _ => None,
        };

        Ok(ClientOptions {
            app_id: self.app_id.trim().to_string(),
            base: CurrencyCode::parse(&self.base)?,
            symbols,
            base_url: self.provider.base_url.clone(),
            throttle: Duration::from_millis(self.throttle_ms),
            latest_ttl: Some(Duration::from_secs(self.cache.latest_ttl_secs)),
        })
    }
}
