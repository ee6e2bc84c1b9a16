use super::RuntimeConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "dockdb.yaml";

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<PathBuf> {
        let current_dir = std::env::current_dir()?;
        Self::find_config_in_dir(&current_dir)
    }

    pub fn find_config_in_dir(dir: &Path) -> Result<PathBuf> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        let alt_path = dir.join("dockdb.yml");
        if alt_path.exists() {
            return Ok(alt_path);
        }

        if let Some(parent) = dir.parent() {
            return Self::find_config_in_dir(parent);
        }

        Err(Error::Config(format!(
            "Could not find {} in current directory or any parent",
            CONFIG_FILE_NAME
        )))
    }

    /// Load config from file path
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<RuntimeConfig> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_config(&content)
    }

    /// Load the config at `path`, or search upwards when no path is given.
    ///
    /// A missing file during the search is not an error: defaults are used.
    pub fn load_or_default(&self, path: Option<&Path>) -> Result<RuntimeConfig> {
        match path {
            Some(path) => self.load_config(path),
            None => match self.find_config_file() {
                Ok(found) => self.load_config(found),
                Err(Error::Config(_)) => {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Ok(RuntimeConfig::default())
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Parse config from YAML string
    pub fn parse_config(&self, content: &str) -> Result<RuntimeConfig> {
        if content.trim().is_empty() {
            return Ok(RuntimeConfig::default());
        }
        let config: RuntimeConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::Parse(format!("Failed to parse YAML config: {}", e)))?;

        Ok(config)
    }

    /// Render a config back to YAML (used by `dockdb config init`).
    pub fn render_config(&self, config: &RuntimeConfig) -> Result<String> {
        Ok(serde_yaml::to_string(config)?)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
cache:
  default_ttl: 10s
polling:
  images_interval: 1m
state:
  persisted_keys:
    - ui.activeTab
"#;
        let config = Parser::new().parse_config(yaml).unwrap();
        assert_eq!(config.cache.default_ttl, Duration::from_secs(10));
        assert_eq!(config.cache.cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.polling.images_interval, Duration::from_secs(60));
        assert_eq!(config.polling.error_threshold, 5);
        assert_eq!(config.state.persisted_keys, vec!["ui.activeTab".to_string()]);
        assert_eq!(config.state.max_history, 50);
    }

    #[test]
    fn test_parse_empty_config_is_default() {
        let config = Parser::new().parse_config("  \n").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let yaml = "cache:\n  ttl: 10s\n";
        assert!(Parser::new().parse_config(yaml).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_duration() {
        let yaml = "cache:\n  default_ttl: soon\n";
        let err = Parser::new().parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn test_render_round_trip() {
        let parser = Parser::new();
        let mut config = RuntimeConfig::default();
        config.cache.default_ttl = Duration::from_millis(1500);
        config.state.persisted_keys = vec!["data.allContainers".to_string()];

        let yaml = parser.render_config(&config).unwrap();
        assert_eq!(parser.parse_config(&yaml).unwrap(), config);
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = Parser::find_config_in_dir(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }
}
