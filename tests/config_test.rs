use dockdb::config::{Parser, RuntimeConfig};
use dockdb::Error;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dockdb.yaml");
    fs::write(
        &path,
        r#"
cache:
  default_ttl: 1m
  cleanup_interval: 10m
polling:
  error_threshold: 3
  containers_interval: 5s
  images_interval: 1500ms
state:
  max_history: 20
  max_history_points: 60
  persisted_keys:
    - ui.activeTab
    - ui.currentChartType
storage:
  path: /tmp/dockdb-storage.json
"#,
    )
    .unwrap();

    let config = Parser::new().load_config(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.cache.default_ttl, Duration::from_secs(60));
    assert_eq!(config.polling.error_threshold, 3);
    assert_eq!(config.polling.images_interval, Duration::from_millis(1500));
    assert_eq!(config.state.max_history_points, 60);
    assert_eq!(config.state.persisted_keys.len(), 2);
    assert_eq!(config.state.persistence_prefix, "docker-db-manager");
    assert_eq!(
        config.storage.resolved_path(),
        std::path::PathBuf::from("/tmp/dockdb-storage.json")
    );
}

#[test]
fn test_config_found_in_ancestor() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("dockdb.yml"), "polling:\n  error_threshold: 7\n").unwrap();
    let nested = temp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let found = Parser::find_config_in_dir(&nested).unwrap();
    assert_eq!(found, temp.path().join("dockdb.yml"));

    let config = Parser::new().load_or_default(Some(&found)).unwrap();
    assert_eq!(config.polling.error_threshold, 7);
    assert_eq!(config.polling.containers_interval, Duration::from_secs(10));
}

#[test]
fn test_unknown_persisted_key_fails_validation() {
    let config = Parser::new()
        .parse_config("state:\n  persisted_keys: [ui.colour]\n")
        .unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("ui.colour"));
}

#[test]
fn test_zero_interval_fails_validation() {
    let config = Parser::new()
        .parse_config("polling:\n  containers_interval: 0s\n")
        .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = Parser::new()
        .load_or_default(Some(&temp.path().join("absent.yaml")))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_rendered_default_parses_back() {
    let parser = Parser::new();
    let rendered = parser.render_config(&RuntimeConfig::default()).unwrap();
    assert_eq!(parser.parse_config(&rendered).unwrap(), RuntimeConfig::default());
}
