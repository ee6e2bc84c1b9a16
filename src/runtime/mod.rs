//! Client runtime wiring.
//!
//! [`ClientRuntime`] is the one place the shared pieces are constructed: one
//! cache, one polling manager and one state store, all built from a
//! [`RuntimeConfig`] and handed out by reference. Refresh tasks fetch through
//! the cache and feed the results into the state store.

use crate::backend::{
    ComposeService, ContainerAction, DatabaseService, ImageService, SharedBackend, VolumeService,
};
use crate::cache::TtlCache;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::polling::{PollOptions, PollingManager};
use crate::state::AppState;
use crate::storage::KeyValueStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cache key for the container list.
pub const CONTAINERS_KEY: &str = "containers";
/// Cache key for the image list.
pub const IMAGES_KEY: &str = "images";
/// Cache key for the supported database engines.
pub const DATABASE_TYPES_KEY: &str = "database-types";

/// Fetch-through-cache refresh operations shared with polling callbacks.
#[derive(Clone)]
struct Refresher {
    cache: Arc<TtlCache>,
    state: Arc<AppState>,
    databases: DatabaseService,
    images: ImageService,
    containers_ttl: Duration,
    images_ttl: Duration,
}

impl Refresher {
    async fn containers(&self) -> Result<usize> {
        let databases = self.databases.clone();
        let value = self
            .cache
            .get(
                CONTAINERS_KEY,
                || async move { Ok::<_, Error>(serde_json::to_value(databases.list_containers().await?)?) },
                Some(self.containers_ttl),
            )
            .await?;
        self.store("allContainers", value)
    }

    async fn images(&self) -> Result<usize> {
        let images = self.images.clone();
        let value = self
            .cache
            .get(
                IMAGES_KEY,
                || async move { Ok::<_, Error>(serde_json::to_value(images.list_images().await?)?) },
                Some(self.images_ttl),
            )
            .await?;
        self.store("allImages", value)
    }

    async fn database_types(&self) -> Result<Vec<Value>> {
        let databases = self.databases.clone();
        let value = self
            .cache
            .get(
                DATABASE_TYPES_KEY,
                || async move { Ok::<_, Error>(Value::Array(databases.get_database_types().await?)) },
                None,
            )
            .await?;
        self.store("databaseTypes", value.clone())?;
        Ok(match value {
            Value::Array(types) => types,
            _ => Vec::new(),
        })
    }

    fn store(&self, key: &str, value: Value) -> Result<usize> {
        let count = value.as_array().map(|items| items.len()).unwrap_or(0);
        if !self.state.set_data(key, value, false) {
            return Err(Error::InvalidStateValue {
                path: format!("data.{}", key),
                reason: "backend returned records of an unexpected shape".to_string(),
            });
        }
        Ok(count)
    }
}

/// The assembled client runtime.
pub struct ClientRuntime {
    config: RuntimeConfig,
    backend: SharedBackend,
    polling: PollingManager,
    refresher: Refresher,
    shutdown: CancellationToken,
    cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl ClientRuntime {
    /// Build the runtime. `storage` backs persisted state paths.
    pub fn new(
        config: RuntimeConfig,
        backend: SharedBackend,
        storage: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(TtlCache::new(config.cache.default_ttl));
        let polling = PollingManager::new(config.polling.error_threshold);
        let state = Arc::new(AppState::from_config(&config.state, storage));
        state.set_backend(Arc::clone(&backend));

        let refresher = Refresher {
            cache,
            state,
            databases: DatabaseService::new(Arc::clone(&backend)),
            images: ImageService::new(Arc::clone(&backend)),
            containers_ttl: config.polling.containers_interval,
            images_ttl: config.polling.images_interval,
        };

        Ok(Self {
            config,
            backend,
            polling,
            refresher,
            shutdown: CancellationToken::new(),
            cleanup: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.refresher.cache
    }

    pub fn polling(&self) -> &PollingManager {
        &self.polling
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.refresher.state
    }

    pub fn databases(&self) -> &DatabaseService {
        &self.refresher.databases
    }

    pub fn images(&self) -> &ImageService {
        &self.refresher.images
    }

    pub fn volumes(&self) -> VolumeService {
        VolumeService::new(Arc::clone(&self.backend))
    }

    pub fn compose(&self) -> ComposeService {
        ComposeService::new(Arc::clone(&self.backend))
    }

    /// Start the cache sweep and the standard refresh tasks.
    ///
    /// `containers` runs right away and on every tab; `images` only while the
    /// `images` tab is active. The polling tab starts from `ui.activeTab`. Each refresh fetches with a TTL equal to its
    /// polling interval, so every tick refetches while a failed tick still
    /// serves the last good list.
    pub fn start(&self) {
        {
            let mut cleanup = self.cleanup.lock();
            if cleanup.is_none() {
                *cleanup = Some(
                    self.refresher
                        .cache
                        .spawn_cleanup(self.config.cache.cleanup_interval, self.shutdown.child_token()),
                );
            }
        }

        let refresher = self.refresher.clone();
        self.polling.register(
            CONTAINERS_KEY,
            move || {
                let refresher = refresher.clone();
                async move { refresher.containers().await.map(|_| ()) }
            },
            self.config.polling.containers_interval,
            PollOptions::default().immediate(),
        );

        let refresher = self.refresher.clone();
        self.polling.register(
            IMAGES_KEY,
            move || {
                let refresher = refresher.clone();
                async move { refresher.images().await.map(|_| ()) }
            },
            self.config.polling.images_interval,
            PollOptions::default().on_tab("images"),
        );

        // ui.activeTab may have been reloaded from storage
        self.polling.set_active_tab(&self.refresher.state.active_tab());

        tracing::info!("Client runtime started");
    }

    /// Fetch the container list (through the cache) into `data.allContainers`.
    pub async fn refresh_containers(&self) -> Result<usize> {
        self.refresher.containers().await
    }

    /// Fetch the image list (through the cache) into `data.allImages`.
    pub async fn refresh_images(&self) -> Result<usize> {
        self.refresher.images().await
    }

    /// Fetch the supported engines (cached) into `data.databaseTypes`.
    pub async fn load_database_types(&self) -> Result<Vec<Value>> {
        self.refresher.database_types().await
    }

    /// Switch tabs: updates `ui.activeTab` and runs the tasks gated on `tab`.
    pub fn set_active_tab(&self, tab: &str) {
        self.refresher.state.set_ui("activeTab", tab, false);
        self.polling.set_active_tab(tab);
    }

    pub fn set_visible(&self, visible: bool) {
        self.polling.set_visible(visible);
    }

    /// Run a lifecycle action, then drop the cached list and refetch it.
    pub async fn container_action(&self, action: ContainerAction, container_id: &str) -> Result<()> {
        tracing::info!("Container {}: {}", action, container_id);
        self.refresher.databases.run(action, container_id).await?;
        self.refresher.cache.invalidate(CONTAINERS_KEY);
        self.refresher.containers().await?;
        Ok(())
    }

    /// Stop the cache sweep and every polling task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.cleanup.lock().take();
        self.polling.shutdown();
        tracing::info!("Client runtime stopped");
    }
}

impl Drop for ClientRuntime {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.polling.clear();
    }
}
