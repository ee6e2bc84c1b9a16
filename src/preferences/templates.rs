use crate::error::{Error, Result};
use crate::storage::{load_json, save_json, KeyValueStore};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage key holding custom templates as a JSON object keyed by id.
pub const CUSTOM_TEMPLATES_KEY: &str = "docker-db-manager-custom-templates";

/// Per-engine settings a template applies to a database form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,

    /// Engine-specific settings not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reusable database configuration preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    /// Settings keyed by database engine (`postgres`, `mysql`, ...)
    pub configurations: BTreeMap<String, TemplateConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    "custom".to_string()
}

impl DbTemplate {
    /// A single-engine template built from a config the user already filled in.
    pub fn from_config(name: &str, description: &str, db_type: &str, config: TemplateConfig) -> Self {
        let config = TemplateConfig {
            memory: config.memory.or_else(|| Some("256m".to_string())),
            cpus: config.cpus.or_else(|| Some("1".to_string())),
            ..config
        };
        Self {
            id: None,
            name: name.to_string(),
            description: description.to_string(),
            icon: None,
            category: default_category(),
            configurations: BTreeMap::from([(db_type.to_string(), config)]),
            created_at: None,
        }
    }
}

/// Custom templates persisted under [`CUSTOM_TEMPLATES_KEY`].
pub struct TemplateStore {
    storage: Arc<dyn KeyValueStore>,
    templates: RwLock<BTreeMap<String, DbTemplate>>,
}

impl TemplateStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let templates = match load_json(storage.as_ref(), CUSTOM_TEMPLATES_KEY) {
            Ok(Some(templates)) => templates,
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::error!("Error loading custom templates: {}", e);
                BTreeMap::new()
            }
        };
        Self {
            storage,
            templates: RwLock::new(templates),
        }
    }

    pub fn list(&self) -> Vec<DbTemplate> {
        self.templates.read().values().cloned().collect()
    }

    pub fn get(&self, template_id: &str) -> Option<DbTemplate> {
        self.templates.read().get(template_id).cloned()
    }

    /// Store `template`, assigning `custom-<millis>` when it has no id.
    /// Returns the id it was saved under.
    pub fn save(&self, template: DbTemplate) -> Result<String> {
        let now = Utc::now();
        let id = template
            .id
            .clone()
            .unwrap_or_else(|| format!("custom-{}", now.timestamp_millis()));

        let stored = DbTemplate {
            id: Some(id.clone()),
            category: default_category(),
            created_at: Some(now),
            ..template
        };

        let mut templates = self.templates.write();
        let mut next = templates.clone();
        next.insert(id.clone(), stored);
        save_json(self.storage.as_ref(), CUSTOM_TEMPLATES_KEY, &next)?;
        *templates = next;

        tracing::info!("Saved custom template {}", id);
        Ok(id)
    }

    /// Returns false if no such template exists.
    pub fn delete(&self, template_id: &str) -> Result<bool> {
        let mut templates = self.templates.write();
        if !templates.contains_key(template_id) {
            return Ok(false);
        }
        let mut next = templates.clone();
        next.remove(template_id);
        save_json(self.storage.as_ref(), CUSTOM_TEMPLATES_KEY, &next)?;
        *templates = next;
        Ok(true)
    }

    /// Overlay the template's settings for `db_type` onto `base`.
    ///
    /// Template fields replace base fields; `env` maps are merged with the
    /// template winning. An unknown template or engine returns `base` as is.
    pub fn apply(&self, template_id: &str, db_type: &str, base: Value) -> Value {
        let Some(template) = self.get(template_id) else {
            tracing::warn!("Template {} not found", template_id);
            return base;
        };
        let Some(config) = template.configurations.get(db_type) else {
            tracing::warn!("No configuration for {} in template {}", db_type, template_id);
            return base;
        };
        merge_config(base, config)
    }

    /// Pretty JSON of one template, for sharing.
    pub fn export(&self, template_id: &str) -> Result<String> {
        let template = self
            .get(template_id)
            .ok_or_else(|| Error::TemplateNotFound(template_id.to_string()))?;
        Ok(serde_json::to_string_pretty(&template)?)
    }

    /// Save a template from exported JSON. Returns its id.
    pub fn import(&self, json: &str) -> Result<String> {
        let template: DbTemplate = serde_json::from_str(json)
            .map_err(|e| Error::Validation(format!("Invalid template format: {}", e)))?;
        if template.name.trim().is_empty() || template.configurations.is_empty() {
            return Err(Error::Validation(
                "Invalid template format: name and configurations are required".to_string(),
            ));
        }
        self.save(template)
    }
}

fn merge_config(base: Value, config: &TemplateConfig) -> Value {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut env = match merged.remove("env") {
        Some(Value::Object(env)) => env,
        _ => Map::new(),
    };

    if let Ok(Value::Object(overlay)) = serde_json::to_value(config) {
        for (key, value) in overlay {
            if key != "env" {
                merged.insert(key, value);
            }
        }
    }
    for (key, value) in &config.env {
        env.insert(key.clone(), Value::String(value.clone()));
    }
    merged.insert("env".to_string(), Value::Object(env));
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn tuned_postgres() -> DbTemplate {
        DbTemplate::from_config(
            "Tuned",
            "bigger buffers",
            "postgres",
            TemplateConfig {
                memory: Some("1g".to_string()),
                env: BTreeMap::from([
                    ("POSTGRES_SHARED_BUFFERS".to_string(), "256MB".to_string()),
                    ("POSTGRES_USER".to_string(), "tuned".to_string()),
                ]),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_save_assigns_id_and_category() {
        let store = TemplateStore::load(Arc::new(MemoryStore::new()));
        let mut template = tuned_postgres();
        template.category = "predefined".to_string();

        let id = store.save(template).unwrap();
        assert!(id.starts_with("custom-"));
        let saved = store.get(&id).unwrap();
        assert_eq!(saved.category, "custom");
        assert!(saved.created_at.is_some());
        assert_eq!(saved.configurations["postgres"].cpus.as_deref(), Some("1"));
    }

    #[test]
    fn test_apply_merges_env_with_template_winning() {
        let store = TemplateStore::load(Arc::new(MemoryStore::new()));
        let id = store.save(tuned_postgres()).unwrap();

        let base = json!({
            "name": "orders",
            "memory": "256m",
            "env": { "POSTGRES_USER": "admin", "POSTGRES_DB": "orders" }
        });
        let applied = store.apply(&id, "postgres", base);

        assert_eq!(applied["name"], "orders");
        assert_eq!(applied["memory"], "1g");
        assert_eq!(applied["env"]["POSTGRES_USER"], "tuned");
        assert_eq!(applied["env"]["POSTGRES_DB"], "orders");
        assert_eq!(applied["env"]["POSTGRES_SHARED_BUFFERS"], "256MB");
    }

    #[test]
    fn test_apply_unknown_returns_base() {
        let store = TemplateStore::load(Arc::new(MemoryStore::new()));
        let id = store.save(tuned_postgres()).unwrap();
        let base = json!({ "memory": "512m" });

        assert_eq!(store.apply("missing", "postgres", base.clone()), base);
        assert_eq!(store.apply(&id, "redis", base.clone()), base);
    }

    #[test]
    fn test_export_import_and_delete() {
        let storage = MemoryStore::new();
        let store = TemplateStore::load(Arc::new(storage.clone()));
        let mut template = tuned_postgres();
        template.id = Some("shared".to_string());
        store.save(template).unwrap();

        let exported = store.export("shared").unwrap();
        assert!(store.delete("shared").unwrap());
        assert!(!store.delete("shared").unwrap());

        let reloaded = TemplateStore::load(Arc::new(storage));
        assert!(reloaded.list().is_empty());
        assert_eq!(reloaded.import(&exported).unwrap(), "shared");
        assert!(matches!(
            reloaded.export("nope"),
            Err(Error::TemplateNotFound(_))
        ));
        assert!(reloaded.import(r#"{"name": "x", "configurations": {}}"#).is_err());
    }
}
