use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend command '{command}' failed: {message}")]
    #[diagnostic(
        code(dockdb::backend::failed),
        help("Check that Docker is running with `docker ps`")
    )]
    Backend { command: String, message: String },

    #[error("Invalid key pattern: {0}")]
    #[diagnostic(code(dockdb::cache::pattern))]
    InvalidPattern(#[from] regex::Error),

    #[error("Unknown state path: {0}")]
    #[diagnostic(
        code(dockdb::state::unknown_path),
        help("State paths have the form <section>.<key>, e.g. ui.activeTab or data.allContainers")
    )]
    UnknownStatePath(String),

    #[error("Invalid value for '{path}': {reason}")]
    #[diagnostic(code(dockdb::state::invalid_value))]
    InvalidStateValue { path: String, reason: String },

    #[error("Storage error: {0}")]
    #[diagnostic(code(dockdb::storage::error))]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(dockdb::config::validation),
        help("Run `dockdb config validate` for detailed validation errors")
    )]
    Validation(String),

    #[error("Template not found: {0}")]
    #[diagnostic(
        code(dockdb::template::not_found),
        help("List custom templates with `dockdb templates list`")
    )]
    TemplateNotFound(String),

    #[error("Polling task '{task}' panicked: {message}")]
    #[diagnostic(code(dockdb::polling::panicked))]
    TaskPanicked { task: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a failed backend command.
    pub fn backend(command: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Backend {
            command: command.into(),
            message: message.to_string(),
        }
    }

    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Backend { command, .. } => Some(format!(
                "The backend rejected '{}'. Check that Docker is running: docker ps",
                command
            )),
            Error::UnknownStatePath(path) => Some(format!(
                "'{}' is not a known state path. Run `dockdb state show` to list the available keys.",
                path
            )),
            Error::InvalidPattern(_) => Some(
                "Cache key patterns are regular expressions, e.g. '^containers:'".to_string(),
            ),
            Error::Config(msg) if msg.contains("Could not find") => Some(
                "Create a default configuration with: dockdb config init".to_string(),
            ),
            Error::Config(_) | Error::Validation(_) | Error::Yaml(_) => {
                Some("Validate your config with: dockdb config validate".to_string())
            }
            Error::Storage(_) => Some(
                "The preference store may be corrupted. Inspect it with `dockdb state show` or remove the storage file to start fresh.".to_string(),
            ),
            Error::TemplateNotFound(_) => {
                Some("List custom templates with: dockdb templates list".to_string())
            }
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
