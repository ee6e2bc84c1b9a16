//! Observable application state.
//!
//! [`AppState`] holds one state tree split into closed sections (`data`,
//! `ui`, `modal`, `monitoring`, `migration`). Every write goes through a
//! `section.key` path that is validated against the section's key set; an
//! unknown key or a value of the wrong shape is logged and dropped without
//! touching the tree or notifying anyone.
//!
//! After an accepted write the store:
//!
//! 1. records an undo snapshot when asked to and history is enabled (`data`/`ui` only)
//! 2. applies the value
//! 3. writes it through to durable storage when the path is persisted
//! 4. notifies the listeners of that exact path, in subscription order
//!
//! Listeners run synchronously on the writing thread after all internal locks
//! are released, so a listener may read or write the store itself.
//!
//! # Example
//!
//! ```ignore
//! let state = AppState::new();
//! let sub = state.subscribe("ui.activeTab", |tab| println!("now on {}", tab));
//! state.set_ui("activeTab", "images", false);
//! sub.unsubscribe();
//! ```

mod history;
mod keys;
mod listeners;
mod snapshot;
mod tree;
mod types;

pub use history::{HistoryEntry, HistoryInfo, DEFAULT_MAX_HISTORY};
pub use keys::{ComponentKey, DataKey, MigrationKey, ModalKey, MonitoringKey, StatePath, UiKey};
pub use listeners::{Listener, ListenerCount, Subscription};
pub use snapshot::{PersistenceInfo, StateSnapshot, StateStats};
pub use tree::{
    DataSection, MigrationSection, ModalSection, MonitoringSection, StateTree, UiSection,
    DEFAULT_MAX_HISTORY_POINTS,
};
pub use types::{ContainerInfo, ImageInfo, ImageSize};

use crate::backend::SharedBackend;
use crate::config::StateConfig;
use crate::storage::KeyValueStore;
use history::History;
use listeners::ListenerRegistry;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Default storage key prefix for persisted paths.
pub const DEFAULT_PERSISTENCE_PREFIX: &str = "docker-db-manager";

/// Opaque live handle stored in a component slot.
pub type ComponentHandle = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone)]
struct Persistence {
    enabled: bool,
    prefix: String,
    keys: Vec<StatePath>,
}

impl Persistence {
    fn storage_key(&self, path: StatePath) -> String {
        format!("{}.{}", self.prefix, path)
    }

    fn covers(&self, path: StatePath) -> bool {
        self.enabled && self.keys.contains(&path)
    }
}

/// The application's observable state store.
///
/// All methods take `&self`; share the store with `Arc<AppState>`.
pub struct AppState {
    // Lock order: history, then tree.
    history: Mutex<History>,
    tree: RwLock<StateTree>,
    listeners: Arc<ListenerRegistry>,
    persistence: RwLock<Persistence>,
    storage: Option<Arc<dyn KeyValueStore>>,
    backend: RwLock<Option<SharedBackend>>,
    components: RwLock<HashMap<ComponentKey, ComponentHandle>>,
    max_history_points: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// In-memory store with default limits and no storage.
    pub fn new() -> Self {
        Self::build(
            DEFAULT_MAX_HISTORY,
            DEFAULT_MAX_HISTORY_POINTS,
            DEFAULT_PERSISTENCE_PREFIX.to_string(),
            None,
        )
    }

    /// Store backed by `storage` for persisted paths.
    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(
            DEFAULT_MAX_HISTORY,
            DEFAULT_MAX_HISTORY_POINTS,
            DEFAULT_PERSISTENCE_PREFIX.to_string(),
            Some(storage),
        )
    }

    /// Store built from config. When storage is given and the config lists
    /// persisted keys, persistence is enabled and those paths are reloaded.
    pub fn from_config(config: &StateConfig, storage: Option<Arc<dyn KeyValueStore>>) -> Self {
        let has_storage = storage.is_some();
        let state = Self::build(
            config.max_history,
            config.max_history_points,
            config.persistence_prefix.clone(),
            storage,
        );
        if has_storage && !config.persisted_keys.is_empty() {
            state.enable_persistence(&config.persisted_keys);
        }
        state
    }

    fn build(
        max_history: usize,
        max_history_points: usize,
        prefix: String,
        storage: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let max_history_points = max_history_points.max(1);
        tracing::debug!("AppState initialized");
        Self {
            history: Mutex::new(History::new(max_history)),
            tree: RwLock::new(StateTree::new(max_history_points)),
            listeners: Arc::new(ListenerRegistry::default()),
            persistence: RwLock::new(Persistence {
                enabled: false,
                prefix,
                keys: Vec::new(),
            }),
            storage,
            backend: RwLock::new(None),
            components: RwLock::new(HashMap::new()),
            max_history_points,
        }
    }

    // ---------------------------------------------------------------
    // Section writes
    // ---------------------------------------------------------------

    /// Write `data.<key>`. Returns whether the write was accepted.
    pub fn set_data<T: Serialize>(&self, key: &str, value: T, save_history: bool) -> bool {
        match DataKey::parse(key) {
            Some(key) => self.write(StatePath::Data(key), value, save_history),
            None => {
                tracing::warn!("Unknown data key: {}", key);
                false
            }
        }
    }

    /// Write `ui.<key>`. Returns whether the write was accepted.
    pub fn set_ui<T: Serialize>(&self, key: &str, value: T, save_history: bool) -> bool {
        match UiKey::parse(key) {
            Some(key) => self.write(StatePath::Ui(key), value, save_history),
            None => {
                tracing::warn!("Unknown UI state key: {}", key);
                false
            }
        }
    }

    pub fn set_modal<T: Serialize>(&self, key: &str, value: T) -> bool {
        match ModalKey::parse(key) {
            Some(key) => self.write(StatePath::Modal(key), value, false),
            None => {
                tracing::warn!("Unknown modal key: {}", key);
                false
            }
        }
    }

    pub fn set_monitoring<T: Serialize>(&self, key: &str, value: T) -> bool {
        match MonitoringKey::parse(key) {
            Some(key) => self.write(StatePath::Monitoring(key), value, false),
            None => {
                tracing::warn!("Unknown monitoring key: {}", key);
                false
            }
        }
    }

    pub fn set_migration<T: Serialize>(&self, key: &str, value: T) -> bool {
        match MigrationKey::parse(key) {
            Some(key) => self.write(StatePath::Migration(key), value, false),
            None => {
                tracing::warn!("Unknown migration key: {}", key);
                false
            }
        }
    }

    /// Write a dotted `section.key` path.
    pub fn set_path<T: Serialize>(&self, path: &str, value: T) -> bool {
        match StatePath::parse(path) {
            Some(path) => self.write(path, value, false),
            None => {
                tracing::warn!("Unknown state path: {}", path);
                false
            }
        }
    }

    /// Write an already validated path.
    pub fn set<T: Serialize>(&self, path: StatePath, value: T, save_history: bool) -> bool {
        self.write(path, value, save_history)
    }

    fn write<T: Serialize>(&self, path: StatePath, value: T, save_history: bool) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Rejected write to {}: {}", path, e);
                return false;
            }
        };
        self.apply(path, value, save_history, true)
    }

    /// Validate and apply one write, then persist and notify outside the locks.
    fn apply(&self, path: StatePath, value: Value, save_history: bool, persist: bool) -> bool {
        let records_history = save_history && matches!(path, StatePath::Data(_) | StatePath::Ui(_));

        let stored = {
            let mut history = self.history.lock();
            let mut tree = self.tree.write();
            let before = (records_history && history.enabled).then(|| HistoryEntry::capture(&tree));

            if let Err(e) = tree.set(path, value) {
                tracing::warn!("Rejected write to {}: {}", path, e);
                return false;
            }
            if let Some(before) = before {
                history.record(before);
                tracing::debug!("State saved to history ({} entries)", history.info().past_length);
            }
            tree.get(path).unwrap_or(Value::Null)
        };

        tracing::debug!("State set: {}", path);
        if persist {
            self.persist(path, &stored);
        }
        self.listeners.notify(&path.to_string(), &stored);
        true
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn get_data(&self, key: &str) -> Option<Value> {
        DataKey::parse(key).and_then(|key| self.get(StatePath::Data(key)))
    }

    pub fn get_ui(&self, key: &str) -> Option<Value> {
        UiKey::parse(key).and_then(|key| self.get(StatePath::Ui(key)))
    }

    pub fn get_modal(&self, key: &str) -> Option<Value> {
        ModalKey::parse(key).and_then(|key| self.get(StatePath::Modal(key)))
    }

    pub fn get_monitoring(&self, key: &str) -> Option<Value> {
        MonitoringKey::parse(key).and_then(|key| self.get(StatePath::Monitoring(key)))
    }

    pub fn get_migration(&self, key: &str) -> Option<Value> {
        MigrationKey::parse(key).and_then(|key| self.get(StatePath::Migration(key)))
    }

    /// Read a dotted `section.key` path.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        StatePath::parse(path).and_then(|path| self.get(path))
    }

    pub fn get(&self, path: StatePath) -> Option<Value> {
        self.tree.read().get(path)
    }

    /// Borrow the tree for typed reads.
    pub fn read<R>(&self, f: impl FnOnce(&StateTree) -> R) -> R {
        f(&self.tree.read())
    }

    pub fn containers(&self) -> Vec<ContainerInfo> {
        self.read(|tree| tree.data.all_containers.clone())
    }

    pub fn images(&self) -> Vec<ImageInfo> {
        self.read(|tree| tree.data.all_images.clone())
    }

    pub fn active_tab(&self) -> String {
        self.read(|tree| tree.ui.active_tab.clone())
    }

    // ---------------------------------------------------------------
    // Monitoring buffers
    // ---------------------------------------------------------------

    /// Append a CPU sample, evicting the oldest beyond `maxHistoryPoints`.
    pub fn add_cpu_sample(&self, sample: f64) {
        let buffer = {
            let mut tree = self.tree.write();
            tree.monitoring.push_cpu(sample);
            tree.get(StatePath::Monitoring(MonitoringKey::CpuHistory))
        };
        self.listeners
            .notify("monitoring.cpuHistory", &buffer.unwrap_or(Value::Null));
    }

    /// Append a memory sample, evicting the oldest beyond `maxHistoryPoints`.
    pub fn add_memory_sample(&self, sample: f64) {
        let buffer = {
            let mut tree = self.tree.write();
            tree.monitoring.push_memory(sample);
            tree.get(StatePath::Monitoring(MonitoringKey::MemoryHistory))
        };
        self.listeners
            .notify("monitoring.memoryHistory", &buffer.unwrap_or(Value::Null));
    }

    pub fn clear_monitoring_history(&self) {
        self.tree.write().monitoring.clear_history();
        tracing::debug!("Monitoring history cleared");
        self.listeners
            .notify("monitoring.history.cleared", &Value::Bool(true));
    }

    // ---------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------

    /// Call `listener` with the new value after every accepted write to `path`.
    ///
    /// `path` is a state path or one of the event paths (`history.undo`,
    /// `history.redo`, `state.restored`, `reset`, `tauri`, `component.<name>`,
    /// `monitoring.history.cleared`).
    pub fn subscribe<F>(&self, path: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.listeners.add(path, Arc::new(listener))
    }

    /// Deliver `value` to the listeners of `path`.
    pub fn notify(&self, path: &str, value: &Value) {
        self.listeners.notify(path, value);
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    pub fn enable_history(&self) {
        self.history.lock().enabled = true;
        tracing::info!("State history enabled");
    }

    pub fn disable_history(&self) {
        self.history.lock().enabled = false;
        tracing::info!("State history disabled");
    }

    /// Push the current state onto the undo stack and clear the redo stack.
    /// Does nothing while history is disabled.
    pub fn save_to_history(&self) {
        let mut history = self.history.lock();
        if !history.enabled {
            return;
        }
        let current = HistoryEntry::capture(&self.tree.read());
        history.record(current);
        tracing::debug!("State saved to history ({} entries)", history.info().past_length);
    }

    /// Restore the previous snapshot. Returns false when there is nothing to undo.
    pub fn undo(&self) -> bool {
        self.step(true)
    }

    /// Re-apply the last undone snapshot. Returns false when there is nothing to redo.
    pub fn redo(&self) -> bool {
        self.step(false)
    }

    fn step(&self, backwards: bool) -> bool {
        let (restored, info) = {
            let mut history = self.history.lock();
            if !history.enabled {
                tracing::warn!(
                    "Cannot {}: history is disabled",
                    if backwards { "undo" } else { "redo" }
                );
                return false;
            }

            let mut tree = self.tree.write();
            let current = HistoryEntry::capture(&tree);
            let target = if backwards {
                history.undo(current)
            } else {
                history.redo(current)
            };
            let Some(target) = target else {
                if backwards {
                    tracing::warn!("Cannot undo: no history available");
                } else {
                    tracing::warn!("Cannot redo: no future history available");
                }
                return false;
            };

            let restored = serde_json::to_value(&target).unwrap_or(Value::Null);
            target.restore(&mut tree);
            (restored, history.info())
        };

        if backwards {
            tracing::info!("State undone ({} left)", info.past_length);
        } else {
            tracing::info!("State redone ({} left)", info.future_length);
        }

        self.persist_all();
        self.listeners.notify("state.restored", &restored);
        let event = if backwards { "history.undo" } else { "history.redo" };
        self.listeners.notify(event, &restored);
        true
    }

    pub fn history_info(&self) -> HistoryInfo {
        self.history.lock().info()
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Mirror `keys` to storage and reload their stored values.
    ///
    /// An empty list keeps the previously configured keys. Unknown paths are
    /// skipped with a warning. Returns the number of values reloaded.
    pub fn enable_persistence<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let Some(storage) = self.storage.clone() else {
            tracing::warn!("Persistence requested but no storage is configured");
            return 0;
        };

        let snapshot = {
            let mut persistence = self.persistence.write();
            persistence.enabled = true;
            if !keys.is_empty() {
                persistence.keys.clear();
                for key in keys {
                    let key = key.as_ref();
                    match StatePath::parse(key) {
                        Some(path) if !persistence.keys.contains(&path) => persistence.keys.push(path),
                        Some(_) => {}
                        None => tracing::warn!("Ignoring unknown persisted path: {}", key),
                    }
                }
            }
            persistence.clone()
        };

        tracing::info!(
            "Persistence enabled: [{}]",
            snapshot
                .keys
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut loaded = 0;
        for path in &snapshot.keys {
            let storage_key = snapshot.storage_key(*path);
            let text = match storage.get_item(&storage_key) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Error loading persisted state {}: {}", path, e);
                    continue;
                }
            };
            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!("Skipping unparsable persisted state {}: {}", path, e);
                    continue;
                }
            };
            if self.apply(*path, value, false, false) {
                tracing::debug!("Loaded persisted state: {}", path);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn disable_persistence(&self) {
        self.persistence.write().enabled = false;
        tracing::info!("Persistence disabled");
    }

    fn persist(&self, path: StatePath, value: &Value) {
        let Some(storage) = &self.storage else {
            return;
        };
        let storage_key = {
            let persistence = self.persistence.read();
            if !persistence.covers(path) {
                return;
            }
            persistence.storage_key(path)
        };

        let result = serde_json::to_string(value)
            .map_err(crate::Error::from)
            .and_then(|text| storage.set_item(&storage_key, &text));
        match result {
            Ok(()) => tracing::debug!("Persisted state: {}", path),
            Err(e) => tracing::error!("Error persisting state {}: {}", path, e),
        }
    }

    fn persist_all(&self) {
        let keys = {
            let persistence = self.persistence.read();
            if !persistence.enabled {
                return;
            }
            persistence.keys.clone()
        };
        for path in keys {
            if let Some(value) = self.get(path) {
                self.persist(path, &value);
            }
        }
    }

    // ---------------------------------------------------------------
    // Backend bridge and components
    // ---------------------------------------------------------------

    pub fn set_backend(&self, backend: SharedBackend) {
        *self.backend.write() = Some(backend);
        tracing::debug!("Backend bridge set");
        self.listeners.notify("tauri", &json!({ "connected": true }));
    }

    pub fn backend(&self) -> Option<SharedBackend> {
        self.backend.read().clone()
    }

    /// Fill or clear a component slot. Unknown names are rejected.
    pub fn set_component(&self, name: &str, handle: Option<ComponentHandle>) -> bool {
        let Some(key) = ComponentKey::parse(name) else {
            tracing::warn!("Unknown component: {}", name);
            return false;
        };

        let marker = if handle.is_some() {
            Value::String("initialized".to_string())
        } else {
            Value::Null
        };
        {
            let mut components = self.components.write();
            match handle {
                Some(handle) => components.insert(key, handle),
                None => components.remove(&key),
            };
        }
        tracing::debug!("Component set: {}", name);
        self.listeners.notify(&format!("component.{}", key), &marker);
        true
    }

    pub fn get_component(&self, name: &str) -> Option<ComponentHandle> {
        let key = ComponentKey::parse(name)?;
        self.components.read().get(&key).cloned()
    }

    // ---------------------------------------------------------------
    // Diagnostics and reset
    // ---------------------------------------------------------------

    /// Copy of the whole store with live handles redacted.
    pub fn get_snapshot(&self) -> StateSnapshot {
        let connected = self.backend.read().is_some();
        let components: BTreeMap<String, Option<String>> = {
            let slots = self.components.read();
            ComponentKey::ALL
                .iter()
                .map(|key| {
                    let marker = slots.get(key).map(|_| "initialized".to_string());
                    (key.as_str().to_string(), marker)
                })
                .collect()
        };

        let tree = self.tree.read();
        StateSnapshot {
            tauri: json!({ "invoke": null, "connected": connected }),
            components,
            data: tree.data.clone(),
            ui: tree.ui.clone(),
            modals: tree.modals.clone(),
            monitoring: tree.monitoring.redacted(),
            migration: tree.migration.clone(),
        }
    }

    /// Restore every section to its defaults and drop all undo history.
    /// The backend bridge, listeners and persistence settings survive.
    pub fn reset(&self) {
        tracing::info!("Resetting state");
        {
            let mut history = self.history.lock();
            let mut tree = self.tree.write();
            history.clear();
            *tree = StateTree::new(self.max_history_points);
        }
        self.components.write().clear();
        self.listeners.notify("reset", &Value::Bool(true));
    }

    pub fn stats(&self) -> StateStats {
        let history = self.history_info();
        let persistence = {
            let p = self.persistence.read();
            PersistenceInfo {
                enabled: p.enabled,
                prefix: p.prefix.clone(),
                keys: p.keys.iter().map(|k| k.to_string()).collect(),
            }
        };

        let tree = self.tree.read();
        StateStats {
            containers: tree.data.all_containers.len(),
            images: tree.data.all_images.len(),
            local_databases: tree.data.all_local_databases.len(),
            migrated_databases: tree.data.all_migrated_databases.len(),
            cpu_history_points: tree.monitoring.cpu_history.len(),
            memory_history_points: tree.monitoring.memory_history.len(),
            active_listeners: self.listeners.counts(),
            history,
            persistence,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tree", &*self.tree.read())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
