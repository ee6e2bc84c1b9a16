use super::{invoke_as, invoke_unit, SharedBackend};
use crate::error::{Error, Result};
use crate::state::ContainerInfo;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Lifecycle operations on a database container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Remove { remove_volumes: bool },
}

impl ContainerAction {
    pub fn command(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start_container",
            ContainerAction::Stop => "stop_container",
            ContainerAction::Restart => "restart_container",
            ContainerAction::Remove { .. } => "remove_container",
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
            ContainerAction::Remove { .. } => "remove",
        };
        f.write_str(name)
    }
}

impl FromStr for ContainerAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(ContainerAction::Start),
            "stop" => Ok(ContainerAction::Stop),
            "restart" => Ok(ContainerAction::Restart),
            "remove" => Ok(ContainerAction::Remove {
                remove_volumes: false,
            }),
            other => Err(Error::Parse(format!("unknown container action '{}'", other))),
        }
    }
}

/// Database container commands.
#[derive(Clone)]
pub struct DatabaseService {
    backend: SharedBackend,
}

impl DatabaseService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Create a container from a form config. Returns the backend's record.
    pub async fn create_database(&self, config: Value) -> Result<Value> {
        self.backend
            .invoke("create_database", json!({ "config": config }))
            .await
    }

    pub async fn list_containers(&self) -> Result<Vec<ContainerInfo>> {
        invoke_as(self.backend.as_ref(), "list_containers", Value::Null).await
    }

    pub async fn start_container(&self, container_id: &str) -> Result<()> {
        self.run(ContainerAction::Start, container_id).await
    }

    pub async fn stop_container(&self, container_id: &str) -> Result<()> {
        self.run(ContainerAction::Stop, container_id).await
    }

    pub async fn restart_container(&self, container_id: &str) -> Result<()> {
        self.run(ContainerAction::Restart, container_id).await
    }

    pub async fn remove_container(&self, container_id: &str, remove_volumes: bool) -> Result<()> {
        self.run(ContainerAction::Remove { remove_volumes }, container_id)
            .await
    }

    /// Dispatch a lifecycle action to its backend command.
    pub async fn run(&self, action: ContainerAction, container_id: &str) -> Result<()> {
        let args = match action {
            ContainerAction::Remove { remove_volumes } => json!({
                "containerId": container_id,
                "removeVolumes": remove_volumes,
            }),
            _ => json!({ "containerId": container_id }),
        };
        invoke_unit(self.backend.as_ref(), action.command(), args).await
    }

    pub async fn update_container_port(&self, container_id: &str, new_port: u16) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "update_container_port",
            json!({ "containerId": container_id, "newPort": new_port }),
        )
        .await
    }

    pub async fn get_container_logs(&self, container_id: &str) -> Result<String> {
        invoke_as(
            self.backend.as_ref(),
            "get_container_logs",
            json!({ "containerId": container_id }),
        )
        .await
    }

    pub async fn get_container_stats(&self, container_id: &str) -> Result<Value> {
        self.backend
            .invoke("get_container_stats", json!({ "containerId": container_id }))
            .await
    }

    pub async fn execute_sql(
        &self,
        container_id: &str,
        database: &str,
        username: &str,
        sql: &str,
    ) -> Result<Value> {
        self.backend
            .invoke(
                "execute_sql",
                json!({
                    "containerId": container_id,
                    "database": database,
                    "username": username,
                    "sql": sql,
                }),
            )
            .await
    }

    pub async fn get_database_types(&self) -> Result<Vec<Value>> {
        invoke_as(self.backend.as_ref(), "get_database_types", Value::Null).await
    }

    /// Whether the backend can reach the Docker daemon.
    pub async fn check_docker_connection(&self) -> Result<bool> {
        let value = self
            .backend
            .invoke("check_docker_connection", Value::Null)
            .await?;
        Ok(match value {
            Value::Bool(connected) => connected,
            Value::Null => false,
            _ => true,
        })
    }
}
