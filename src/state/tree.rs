use super::keys::{DataKey, MigrationKey, ModalKey, MonitoringKey, StatePath, UiKey};
use super::types::{ContainerInfo, ImageInfo};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

/// Samples kept per monitoring buffer unless configured otherwise.
pub const DEFAULT_MAX_HISTORY_POINTS: usize = 30;

fn read<T: Serialize>(field: &T) -> Option<Value> {
    serde_json::to_value(field).ok()
}

fn write<T: DeserializeOwned>(path: StatePath, slot: &mut T, value: Value) -> Result<()> {
    *slot = serde_json::from_value(value).map_err(|e| Error::InvalidStateValue {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn trim_front<T>(buffer: &mut VecDeque<T>, cap: usize) {
    while buffer.len() > cap {
        buffer.pop_front();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSection {
    pub all_containers: Vec<ContainerInfo>,
    pub all_images: Vec<ImageInfo>,
    pub all_local_databases: Vec<Value>,
    pub all_migrated_databases: Vec<Value>,
    pub database_types: Vec<Value>,
}

impl DataSection {
    pub fn get(&self, key: DataKey) -> Option<Value> {
        match key {
            DataKey::AllContainers => read(&self.all_containers),
            DataKey::AllImages => read(&self.all_images),
            DataKey::AllLocalDatabases => read(&self.all_local_databases),
            DataKey::AllMigratedDatabases => read(&self.all_migrated_databases),
            DataKey::DatabaseTypes => read(&self.database_types),
        }
    }

    pub fn set(&mut self, key: DataKey, value: Value) -> Result<()> {
        let path = StatePath::Data(key);
        match key {
            DataKey::AllContainers => write(path, &mut self.all_containers, value),
            DataKey::AllImages => write(path, &mut self.all_images, value),
            DataKey::AllLocalDatabases => write(path, &mut self.all_local_databases, value),
            DataKey::AllMigratedDatabases => write(path, &mut self.all_migrated_databases, value),
            DataKey::DatabaseTypes => write(path, &mut self.database_types, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSection {
    pub active_tab: String,
    pub selected_db_type: Option<String>,
    pub selected_template_for_db: Option<String>,
    pub current_chart_type: String,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            active_tab: "dashboard".to_string(),
            selected_db_type: None,
            selected_template_for_db: None,
            current_chart_type: "line".to_string(),
        }
    }
}

impl UiSection {
    pub fn get(&self, key: UiKey) -> Option<Value> {
        match key {
            UiKey::ActiveTab => read(&self.active_tab),
            UiKey::SelectedDbType => read(&self.selected_db_type),
            UiKey::SelectedTemplateForDb => read(&self.selected_template_for_db),
            UiKey::CurrentChartType => read(&self.current_chart_type),
        }
    }

    pub fn set(&mut self, key: UiKey, value: Value) -> Result<()> {
        let path = StatePath::Ui(key);
        match key {
            UiKey::ActiveTab => write(path, &mut self.active_tab, value),
            UiKey::SelectedDbType => write(path, &mut self.selected_db_type, value),
            UiKey::SelectedTemplateForDb => write(path, &mut self.selected_template_for_db, value),
            UiKey::CurrentChartType => write(path, &mut self.current_chart_type, value),
        }
    }
}

/// Entity currently targeted by each modal dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalSection {
    pub current_rename_container_id: Option<String>,
    #[serde(rename = "currentSQL")]
    pub current_sql: Option<Value>,
    pub current_volume: Option<Value>,
    pub current_monitoring_container: Option<String>,
}

impl ModalSection {
    pub fn get(&self, key: ModalKey) -> Option<Value> {
        match key {
            ModalKey::CurrentRenameContainerId => read(&self.current_rename_container_id),
            ModalKey::CurrentSql => read(&self.current_sql),
            ModalKey::CurrentVolume => read(&self.current_volume),
            ModalKey::CurrentMonitoringContainer => read(&self.current_monitoring_container),
        }
    }

    pub fn set(&mut self, key: ModalKey, value: Value) -> Result<()> {
        let path = StatePath::Modal(key);
        match key {
            ModalKey::CurrentRenameContainerId => {
                write(path, &mut self.current_rename_container_id, value)
            }
            ModalKey::CurrentSql => write(path, &mut self.current_sql, value),
            ModalKey::CurrentVolume => write(path, &mut self.current_volume, value),
            ModalKey::CurrentMonitoringContainer => {
                write(path, &mut self.current_monitoring_container, value)
            }
        }
    }
}

/// Live monitoring view: timer/chart handle ids and bounded sample buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSection {
    pub interval: Option<String>,
    pub cpu_chart: Option<String>,
    pub memory_chart: Option<String>,
    pub cpu_history: VecDeque<f64>,
    pub memory_history: VecDeque<f64>,
    pub max_history_points: usize,
}

impl Default for MonitoringSection {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY_POINTS)
    }
}

impl MonitoringSection {
    pub fn with_capacity(max_history_points: usize) -> Self {
        Self {
            interval: None,
            cpu_chart: None,
            memory_chart: None,
            cpu_history: VecDeque::with_capacity(max_history_points),
            memory_history: VecDeque::with_capacity(max_history_points),
            max_history_points,
        }
    }

    pub fn get(&self, key: MonitoringKey) -> Option<Value> {
        match key {
            MonitoringKey::Interval => read(&self.interval),
            MonitoringKey::CpuChart => read(&self.cpu_chart),
            MonitoringKey::MemoryChart => read(&self.memory_chart),
            MonitoringKey::CpuHistory => read(&self.cpu_history),
            MonitoringKey::MemoryHistory => read(&self.memory_history),
            MonitoringKey::MaxHistoryPoints => read(&self.max_history_points),
        }
    }

    pub fn set(&mut self, key: MonitoringKey, value: Value) -> Result<()> {
        let path = StatePath::Monitoring(key);
        match key {
            MonitoringKey::Interval => write(path, &mut self.interval, value),
            MonitoringKey::CpuChart => write(path, &mut self.cpu_chart, value),
            MonitoringKey::MemoryChart => write(path, &mut self.memory_chart, value),
            MonitoringKey::CpuHistory => {
                write(path, &mut self.cpu_history, value)?;
                trim_front(&mut self.cpu_history, self.max_history_points);
                Ok(())
            }
            MonitoringKey::MemoryHistory => {
                write(path, &mut self.memory_history, value)?;
                trim_front(&mut self.memory_history, self.max_history_points);
                Ok(())
            }
            MonitoringKey::MaxHistoryPoints => {
                let mut points = 0usize;
                write(path, &mut points, value)?;
                if points == 0 {
                    return Err(Error::InvalidStateValue {
                        path: path.to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                self.max_history_points = points;
                trim_front(&mut self.cpu_history, points);
                trim_front(&mut self.memory_history, points);
                Ok(())
            }
        }
    }

    pub fn push_cpu(&mut self, sample: f64) {
        self.cpu_history.push_back(sample);
        trim_front(&mut self.cpu_history, self.max_history_points);
    }

    pub fn push_memory(&mut self, sample: f64) {
        self.memory_history.push_back(sample);
        trim_front(&mut self.memory_history, self.max_history_points);
    }

    pub fn clear_history(&mut self) {
        self.cpu_history.clear();
        self.memory_history.clear();
    }

    /// Copy with chart handles replaced by `"initialized"`.
    pub fn redacted(&self) -> Self {
        let mark = |handle: &Option<String>| handle.as_ref().map(|_| "initialized".to_string());
        Self {
            cpu_chart: mark(&self.cpu_chart),
            memory_chart: mark(&self.memory_chart),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSection {
    pub local_postgres_config: Option<Value>,
}

impl MigrationSection {
    pub fn get(&self, key: MigrationKey) -> Option<Value> {
        match key {
            MigrationKey::LocalPostgresConfig => read(&self.local_postgres_config),
        }
    }

    pub fn set(&mut self, key: MigrationKey, value: Value) -> Result<()> {
        let path = StatePath::Migration(key);
        match key {
            MigrationKey::LocalPostgresConfig => write(path, &mut self.local_postgres_config, value),
        }
    }
}

/// The whole state tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTree {
    pub data: DataSection,
    pub ui: UiSection,
    pub modals: ModalSection,
    pub monitoring: MonitoringSection,
    pub migration: MigrationSection,
}

impl StateTree {
    pub fn new(max_history_points: usize) -> Self {
        Self {
            data: DataSection::default(),
            ui: UiSection::default(),
            modals: ModalSection::default(),
            monitoring: MonitoringSection::with_capacity(max_history_points),
            migration: MigrationSection::default(),
        }
    }

    pub fn get(&self, path: StatePath) -> Option<Value> {
        match path {
            StatePath::Data(key) => self.data.get(key),
            StatePath::Ui(key) => self.ui.get(key),
            StatePath::Modal(key) => self.modals.get(key),
            StatePath::Monitoring(key) => self.monitoring.get(key),
            StatePath::Migration(key) => self.migration.get(key),
        }
    }

    /// Apply one write. On error the tree is unchanged.
    pub fn set(&mut self, path: StatePath, value: Value) -> Result<()> {
        match path {
            StatePath::Data(key) => self.data.set(key, value),
            StatePath::Ui(key) => self.ui.set(key, value),
            StatePath::Modal(key) => self.modals.set(key, value),
            StatePath::Monitoring(key) => self.monitoring.set(key, value),
            StatePath::Migration(key) => self.migration.set(key, value),
        }
    }
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_POINTS)
    }
}
