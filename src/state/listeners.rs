use crate::polling::panic_message;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with the new value at a subscribed path.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Path-keyed listener lists, in subscription order.
#[derive(Default)]
pub(super) struct ListenerRegistry {
    next_id: AtomicU64,
    by_path: RwLock<HashMap<String, Vec<(u64, Listener)>>>,
}

impl ListenerRegistry {
    pub fn add(self: &Arc<Self>, path: &str, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let count = {
            let mut by_path = self.by_path.write();
            let list = by_path.entry(path.to_string()).or_default();
            list.push((id, listener));
            list.len()
        };
        tracing::debug!("Subscribed to: {} ({} listeners)", path, count);

        Subscription {
            path: path.to_string(),
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, path: &str, id: u64) -> bool {
        let mut by_path = self.by_path.write();
        let Some(list) = by_path.get_mut(path) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            by_path.remove(path);
        }
        removed
    }

    /// Call every listener on `path`. A panicking listener is logged and skipped.
    pub fn notify(&self, path: &str, value: &Value) {
        // Snapshot so listeners may subscribe or unsubscribe while being called
        let listeners: Vec<Listener> = match self.by_path.read().get(path) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        for listener in listeners {
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| listener(value))) {
                tracing::error!(
                    "Error in listener for {}: {}",
                    path,
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }

    pub fn counts(&self) -> Vec<ListenerCount> {
        let mut counts: Vec<ListenerCount> = self
            .by_path
            .read()
            .iter()
            .map(|(path, list)| ListenerCount {
                path: path.clone(),
                count: list.len(),
            })
            .collect();
        counts.sort_by(|a, b| a.path.cmp(&b.path));
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerCount {
    pub path: String,
    pub count: usize,
}

/// Handle returned by `subscribe`. Dropping it keeps the listener registered.
#[derive(Debug)]
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    path: String,
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.remove(&self.path, self.id);
        if removed {
            tracing::debug!("Unsubscribed from: {}", self.path);
        }
        removed
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("paths", &self.by_path.read().len())
            .finish()
    }
}
