use super::RuntimeConfig;
use crate::error::{Error, Result};
use crate::state::StatePath;
use std::collections::HashSet;

impl RuntimeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache.default_ttl.is_zero() {
            return Err(Error::Validation(
                "cache.default_ttl must be greater than zero".to_string(),
            ));
        }
        if self.cache.cleanup_interval.is_zero() {
            return Err(Error::Validation(
                "cache.cleanup_interval must be greater than zero".to_string(),
            ));
        }

        if self.polling.error_threshold == 0 {
            return Err(Error::Validation(
                "polling.error_threshold must be at least 1".to_string(),
            ));
        }
        for (name, interval) in [
            ("containers_interval", self.polling.containers_interval),
            ("images_interval", self.polling.images_interval),
        ] {
            if interval.is_zero() {
                return Err(Error::Validation(format!(
                    "polling.{} must be greater than zero",
                    name
                )));
            }
        }

        if self.state.max_history == 0 {
            return Err(Error::Validation(
                "state.max_history must be at least 1".to_string(),
            ));
        }
        if self.state.max_history_points == 0 {
            return Err(Error::Validation(
                "state.max_history_points must be at least 1".to_string(),
            ));
        }
        if self.state.persistence_prefix.trim().is_empty() {
            return Err(Error::Validation(
                "state.persistence_prefix cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for key in &self.state.persisted_keys {
            if StatePath::parse(key).is_none() {
                return Err(Error::Validation(format!(
                    "state.persisted_keys contains '{}', which is not a known state path. Use <section>.<key>, e.g. ui.activeTab",
                    key
                )));
            }
            if !seen.insert(key.as_str()) {
                return Err(Error::Validation(format!(
                    "state.persisted_keys lists '{}' more than once",
                    key
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = RuntimeConfig::default();
        config.cache.default_ttl = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_ttl"));
    }

    #[test]
    fn test_zero_error_threshold_rejected() {
        let mut config = RuntimeConfig::default();
        config.polling.error_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_persisted_key_rejected() {
        let mut config = RuntimeConfig::default();
        config.state.persisted_keys = vec!["ui.activeTab".into(), "ui.theme".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ui.theme"));
    }

    #[test]
    fn test_duplicate_persisted_key_rejected() {
        let mut config = RuntimeConfig::default();
        config.state.persisted_keys = vec!["ui.activeTab".into(), "ui.activeTab".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_known_persisted_keys_accepted() {
        let mut config = RuntimeConfig::default();
        config.state.persisted_keys = vec![
            "ui.activeTab".into(),
            "data.allContainers".into(),
            "modal.currentSQL".into(),
            "migration.localPostgresConfig".into(),
        ];
        assert!(config.validate().is_ok());
    }
}
