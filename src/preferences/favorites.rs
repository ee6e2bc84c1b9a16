use crate::state::ContainerInfo;
use crate::storage::{load_json, save_json, KeyValueStore};
use parking_lot::RwLock;
use std::sync::Arc;

/// Storage key holding the favorite container ids as a JSON array.
pub const FAVORITES_KEY: &str = "docker-db-favorites";

/// Ordered set of favorite container ids.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
    ids: RwLock<Vec<String>>,
}

impl FavoritesStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let ids = match load_json::<Vec<String>>(storage.as_ref(), FAVORITES_KEY) {
            Ok(Some(mut ids)) => {
                let mut seen = std::collections::HashSet::new();
                ids.retain(|id| seen.insert(id.clone()));
                tracing::debug!("Loaded {} favorites", ids.len());
                ids
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Error loading favorites: {}", e);
                Vec::new()
            }
        };
        Self {
            storage,
            ids: RwLock::new(ids),
        }
    }

    fn save(&self, ids: &[String]) {
        if let Err(e) = save_json(self.storage.as_ref(), FAVORITES_KEY, ids) {
            tracing::error!("Error saving favorites: {}", e);
        }
    }

    /// Returns false if the id was already a favorite.
    pub fn add(&self, container_id: &str) -> bool {
        let mut ids = self.ids.write();
        if ids.iter().any(|id| id == container_id) {
            return false;
        }
        ids.push(container_id.to_string());
        self.save(&ids);
        true
    }

    /// Returns false if the id was not a favorite.
    pub fn remove(&self, container_id: &str) -> bool {
        let mut ids = self.ids.write();
        let before = ids.len();
        ids.retain(|id| id != container_id);
        if ids.len() == before {
            return false;
        }
        self.save(&ids);
        true
    }

    /// Flip the favorite flag. Returns the new state.
    pub fn toggle(&self, container_id: &str) -> bool {
        if self.is_favorite(container_id) {
            self.remove(container_id);
            false
        } else {
            self.add(container_id);
            true
        }
    }

    pub fn is_favorite(&self, container_id: &str) -> bool {
        self.ids.read().iter().any(|id| id == container_id)
    }

    pub fn list(&self) -> Vec<String> {
        self.ids.read().clone()
    }

    pub fn count(&self) -> usize {
        self.ids.read().len()
    }

    pub fn clear(&self) {
        let mut ids = self.ids.write();
        ids.clear();
        self.save(&ids);
    }

    /// Stable sort putting favorites first.
    pub fn sort_by_favorites(&self, containers: &mut [ContainerInfo]) {
        let ids = self.ids.read();
        containers.sort_by_key(|c| !ids.contains(&c.id));
    }

    pub fn filter_favorites(&self, containers: &[ContainerInfo]) -> Vec<ContainerInfo> {
        let ids = self.ids.read();
        containers
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn container(id: &str) -> ContainerInfo {
        ContainerInfo {
            id: id.to_string(),
            name: format!("db-{}", id),
            status: "running".to_string(),
            port: Some(5432),
            created: String::new(),
            database_name: "app".to_string(),
            db_type: None,
        }
    }

    #[test]
    fn test_add_remove_toggle() {
        let favorites = FavoritesStore::load(Arc::new(MemoryStore::new()));
        assert!(favorites.add("a"));
        assert!(!favorites.add("a"));
        assert!(favorites.toggle("b"));
        assert!(!favorites.toggle("a"));
        assert_eq!(favorites.list(), vec!["b".to_string()]);
        assert!(!favorites.remove("a"));
        assert_eq!(favorites.count(), 1);
    }

    #[test]
    fn test_sort_is_stable_with_favorites_first() {
        let favorites = FavoritesStore::load(Arc::new(MemoryStore::new()));
        favorites.add("c");
        favorites.add("a");

        let mut containers = vec![container("a"), container("b"), container("c"), container("d")];
        favorites.sort_by_favorites(&mut containers);
        let order: Vec<&str> = containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);

        let only = favorites.filter_favorites(&containers);
        assert_eq!(only.len(), 2);
    }

    #[test]
    fn test_persists_across_loads() {
        let storage = MemoryStore::new();
        let first = FavoritesStore::load(Arc::new(storage.clone()));
        first.add("x");
        first.add("y");

        let second = FavoritesStore::load(Arc::new(storage.clone()));
        assert_eq!(second.list(), vec!["x".to_string(), "y".to_string()]);
        second.clear();
        assert_eq!(storage.get_item(FAVORITES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let storage = MemoryStore::new();
        storage.set_item(FAVORITES_KEY, "{oops").unwrap();
        let favorites = FavoritesStore::load(Arc::new(storage));
        assert_eq!(favorites.count(), 0);
    }
}
