use super::{invoke_as, invoke_unit, SharedBackend};
use crate::error::Result;
use serde_json::{json, Value};

/// Docker volume commands.
#[derive(Clone)]
pub struct VolumeService {
    backend: SharedBackend,
}

impl VolumeService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn list_volumes(&self) -> Result<Vec<Value>> {
        invoke_as(self.backend.as_ref(), "list_volumes", Value::Null).await
    }

    pub async fn remove_volume(&self, volume_name: &str) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "remove_volume",
            json!({ "volumeName": volume_name }),
        )
        .await
    }

    /// Remove every unused volume. Returns the backend's summary.
    pub async fn prune_volumes(&self) -> Result<Value> {
        self.backend.invoke("prune_volumes", Value::Null).await
    }

    pub async fn backup_volume(&self, volume_name: &str, backup_path: &str) -> Result<Value> {
        self.backend
            .invoke(
                "backup_volume",
                json!({ "volumeName": volume_name, "backupPath": backup_path }),
            )
            .await
    }

    pub async fn restore_volume(&self, volume_name: &str, backup_file: &str) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "restore_volume",
            json!({ "volumeName": volume_name, "backupFile": backup_file }),
        )
        .await
    }
}
