use super::duration::serde_duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level runtime configuration (`dockdb.yaml`).
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub cache: CacheConfig,
    pub polling: PollingConfig,
    pub state: StateConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL applied when a caller does not pass one
    #[serde(with = "serde_duration")]
    pub default_ttl: Duration,

    /// Period of the background sweep that drops expired entries
    #[serde(with = "serde_duration")]
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Failed runs after which a task pauses itself
    pub error_threshold: u32,

    #[serde(with = "serde_duration")]
    pub containers_interval: Duration,

    #[serde(with = "serde_duration")]
    pub images_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            error_threshold: 5,
            containers_interval: Duration::from_secs(10),
            images_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Depth of the undo stack
    pub max_history: usize,

    /// Samples kept per monitoring buffer
    pub max_history_points: usize,

    /// Prefix of every storage key written by state persistence
    pub persistence_prefix: String,

    /// Dotted paths mirrored to durable storage, e.g. `ui.activeTab`
    pub persisted_keys: Vec<String>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            max_history_points: 30,
            persistence_prefix: "docker-db-manager".to_string(),
            persisted_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// JSON file backing the durable key-value store
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Storage file location, falling back to the platform data directory.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dockdb")
            .join("storage.json")
    }
}
