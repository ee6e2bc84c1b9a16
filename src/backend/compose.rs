use super::{invoke_as, invoke_unit, SharedBackend};
use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// Docker Compose project commands.
#[derive(Clone)]
pub struct ComposeService {
    backend: SharedBackend,
}

/// Local pre-flight check of compose YAML before it is sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposeValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ComposeService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn list_compose_projects(&self) -> Result<Vec<Value>> {
        invoke_as(self.backend.as_ref(), "list_compose_projects", Value::Null).await
    }

    pub async fn parse_compose_file(&self, yaml_content: &str) -> Result<Value> {
        self.backend
            .invoke("parse_compose_file", json!({ "yamlContent": yaml_content }))
            .await
    }

    /// Render a compose file reproducing the given containers.
    pub async fn generate_compose_from_containers(&self, container_ids: &[String]) -> Result<String> {
        invoke_as(
            self.backend.as_ref(),
            "generate_compose_from_containers",
            json!({ "containerIds": container_ids }),
        )
        .await
    }

    /// Deploy `yaml_content` as `project_name`. Returns the created container ids.
    pub async fn deploy_compose_file(&self, yaml_content: &str, project_name: &str) -> Result<Vec<String>> {
        invoke_as(
            self.backend.as_ref(),
            "deploy_compose_file",
            json!({ "yamlContent": yaml_content, "projectName": project_name }),
        )
        .await
    }

    pub async fn stop_compose_project(&self, project_name: &str) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "stop_compose_project",
            json!({ "projectName": project_name }),
        )
        .await
    }

    pub async fn remove_compose_project(&self, project_name: &str, remove_volumes: bool) -> Result<()> {
        invoke_unit(
            self.backend.as_ref(),
            "remove_compose_project",
            json!({ "projectName": project_name, "removeVolumes": remove_volumes }),
        )
        .await
    }

    /// Check compose YAML locally: it must parse, use spaces for indentation
    /// and have a `services` mapping. Odd indentation is only a warning.
    pub fn validate_compose(yaml_content: &str) -> ComposeValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if yaml_content.contains('\t') {
            errors.push("YAML should use spaces, not tabs for indentation".to_string());
        }

        for (index, line) in yaml_content.lines().enumerate() {
            let indent = line.len() - line.trim_start_matches(' ').len();
            if indent % 2 != 0 && !line.trim().is_empty() {
                warnings.push(format!(
                    "Line {}: Inconsistent indentation (should be multiples of 2)",
                    index + 1
                ));
            }
        }

        match serde_yaml::from_str::<serde_yaml::Value>(yaml_content) {
            Ok(doc) => match doc.get("services") {
                Some(serde_yaml::Value::Mapping(services)) if !services.is_empty() => {}
                Some(_) => errors.push("Field 'services' must be a non-empty mapping".to_string()),
                None => errors.push("Missing required field: services".to_string()),
            },
            Err(e) => errors.push(format!("Invalid YAML: {}", e)),
        }

        ComposeValidation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
