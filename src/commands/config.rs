use crate::output::UserOutput;
use dockdb::config::{format_duration, Parser as ConfigParser, RuntimeConfig};
use std::path::{Path, PathBuf};

const TEMPLATE: &str = r#"# dockdb runtime configuration

cache:
  # TTL for cached backend results when a caller gives none
  default_ttl: 30s
  # How often expired entries are swept
  cleanup_interval: 5m

polling:
  # Failed runs before a refresh task pauses itself
  error_threshold: 5
  containers_interval: 10s
  images_interval: 30s

state:
  max_history: 50
  max_history_points: 30
  persistence_prefix: docker-db-manager
  # Dotted state paths mirrored to storage
  persisted_keys:
    - ui.activeTab
    - ui.currentChartType

# storage:
#   path: ./dockdb-storage.json
"#;

pub fn run_config_init(output: &Path, force: bool, out: &dyn UserOutput) -> anyhow::Result<()> {
    if output.exists() && !force {
        out.error(&format!("Error: {} already exists", output.display()));
        out.error("Use --force to overwrite");
        return Err(anyhow::anyhow!("File already exists"));
    }

    std::fs::write(output, TEMPLATE)?;
    out.success(&format!("Created {}", output.display()));
    out.status("\nNext steps:");
    out.status(&format!("  1. Edit {} to taste", output.display()));
    out.status("  2. Run: dockdb config validate");
    Ok(())
}

pub fn run_config_validate(config_path: Option<PathBuf>, out: &dyn UserOutput) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config_path = match config_path {
        Some(path) => path,
        None => match parser.find_config_file() {
            Ok(path) => path,
            Err(_) => {
                out.error("Error: No configuration file found");
                out.error(&format!(
                    "\nSearched for dockdb.yaml in {} and its parents",
                    std::env::current_dir()?.display()
                ));
                out.error("\nHint: Run 'dockdb config init' to create a starter configuration");
                return Err(anyhow::anyhow!("Configuration file not found"));
            }
        },
    };

    out.status(&format!("Validating {}...", config_path.display()));
    let config = parser.load_config(&config_path)?;
    config.validate()?;

    out.success("Configuration is valid\n");
    summarize(&config, out);
    Ok(())
}

pub fn run_config_show(config_path: Option<PathBuf>, out: &dyn UserOutput) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config = parser.load_or_default(config_path.as_deref())?;
    out.data(&parser.render_config(&config)?);
    Ok(())
}

fn summarize(config: &RuntimeConfig, out: &dyn UserOutput) {
    out.status(&format!(
        "Cache: ttl {}, sweep every {}",
        format_duration(config.cache.default_ttl),
        format_duration(config.cache.cleanup_interval)
    ));
    out.status(&format!(
        "Polling: containers every {}, images every {}, pause after {} failures",
        format_duration(config.polling.containers_interval),
        format_duration(config.polling.images_interval),
        config.polling.error_threshold
    ));
    out.status(&format!(
        "State: {} undo steps, {} monitoring points, {} persisted path(s)",
        config.state.max_history,
        config.state.max_history_points,
        config.state.persisted_keys.len()
    ));
    out.status(&format!("Storage: {}", config.storage.resolved_path().display()));
}
