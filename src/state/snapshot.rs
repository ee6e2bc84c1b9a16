use super::history::HistoryInfo;
use super::listeners::ListenerCount;
use super::tree::{DataSection, MigrationSection, ModalSection, MonitoringSection, UiSection};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serializable copy of the whole store with live handles redacted.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    /// Backend bridge presence; the handle itself is never exposed
    pub tauri: Value,
    /// `"initialized"` for each set component slot, `null` otherwise
    pub components: BTreeMap<String, Option<String>>,
    pub data: DataSection,
    pub ui: UiSection,
    pub modals: ModalSection,
    pub monitoring: MonitoringSection,
    pub migration: MigrationSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistenceInfo {
    pub enabled: bool,
    pub prefix: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateStats {
    pub containers: usize,
    pub images: usize,
    pub local_databases: usize,
    pub migrated_databases: usize,
    pub cpu_history_points: usize,
    pub memory_history_points: usize,
    pub active_listeners: Vec<ListenerCount>,
    pub history: HistoryInfo,
    pub persistence: PersistenceInfo,
}
