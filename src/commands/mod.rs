mod config;
mod favorites;
mod state;
mod templates;

pub use config::{run_config_init, run_config_show, run_config_validate};
pub use favorites::run_favorites;
pub use state::run_state;
pub use templates::run_templates;

use dockdb::config::{Parser as ConfigParser, RuntimeConfig};
use dockdb::storage::{FileStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;

/// What every storage-backed command needs.
pub struct Context {
    pub config: RuntimeConfig,
    pub storage: Arc<dyn KeyValueStore>,
    pub storage_path: PathBuf,
}

impl Context {
    /// Load the config (or defaults) and open the storage file.
    pub fn load(config_path: Option<PathBuf>, storage_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = ConfigParser::new().load_or_default(config_path.as_deref())?;
        config.validate()?;

        let storage_path = storage_path.unwrap_or_else(|| config.storage.resolved_path());
        tracing::debug!("Using storage file {}", storage_path.display());
        let storage = FileStore::open(&storage_path)?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            storage_path,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Context;
    use crate::output::UserOutput;
    use dockdb::config::RuntimeConfig;
    use dockdb::storage::MemoryStore;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Collects every line a command reports.
    #[derive(Default)]
    pub struct RecordingOutput {
        pub lines: Mutex<Vec<String>>,
    }

    impl RecordingOutput {
        pub fn text(&self) -> String {
            self.lines.lock().join("\n")
        }
    }

    impl UserOutput for RecordingOutput {
        fn status(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn success(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn warning(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn error(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn data(&self, payload: &str) {
            self.lines.lock().push(payload.to_string());
        }
    }

    pub fn memory_context() -> (Context, MemoryStore) {
        let store = MemoryStore::new();
        let ctx = Context {
            config: RuntimeConfig::default(),
            storage: Arc::new(store.clone()),
            storage_path: PathBuf::from("memory"),
        };
        (ctx, store)
    }
}
