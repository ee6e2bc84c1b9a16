//! Durable key/value storage for preferences and persisted state.
//!
//! Values are JSON text, keyed by flat strings (`docker-db-favorites`,
//! `docker-db-manager.ui.activeTab`, ...). A missing key is `Ok(None)`, never
//! an error.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Synchronous string key/value store.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether the key existed.
    fn remove_item(&self, key: &str) -> Result<bool>;

    /// All keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Read and decode a JSON value. Absent keys yield `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get_item(key)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    store.set_item(key, &text)
}
