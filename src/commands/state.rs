use super::Context;
use crate::cli::StateCommands;
use crate::output::UserOutput;
use dockdb::state::{AppState, StatePath};
use dockdb::storage::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;

/// State paths that currently have a stored value.
fn stored_paths(ctx: &Context) -> anyhow::Result<Vec<String>> {
    let prefix = format!("{}.", ctx.config.state.persistence_prefix);
    Ok(ctx
        .storage
        .keys()?
        .into_iter()
        .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
        .filter(|path| StatePath::parse(path).is_some())
        .collect())
}

/// Store with every configured or already stored path persisted.
fn open_state(ctx: &Context, extra: Option<&str>) -> anyhow::Result<AppState> {
    let state = AppState::from_config(&ctx.config.state, Some(Arc::clone(&ctx.storage)));

    let mut keys = ctx.config.state.persisted_keys.clone();
    for path in stored_paths(ctx)?.into_iter().chain(extra.map(str::to_string)) {
        if !keys.contains(&path) {
            keys.push(path);
        }
    }
    if !keys.is_empty() {
        state.enable_persistence(&keys);
    }
    Ok(state)
}

/// Parse a CLI value: JSON when it parses, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn run_state(cmd: &StateCommands, ctx: &Context, out: &dyn UserOutput) -> anyhow::Result<()> {
    match cmd {
        StateCommands::Show(flags) => {
            let state = open_state(ctx, None)?;
            if flags.json {
                out.data(&serde_json::to_string_pretty(&state.get_snapshot())?);
                return Ok(());
            }

            let stats = state.stats();
            out.status(&format!("Storage: {}", ctx.storage_path.display()));
            out.status(&format!(
                "Persisted paths: {}",
                if stats.persistence.keys.is_empty() {
                    "(none)".to_string()
                } else {
                    stats.persistence.keys.join(", ")
                }
            ));
            for path in StatePath::all() {
                let value = state.get(path).unwrap_or(Value::Null);
                out.status(&format!("  {:<40} {}", path.to_string(), value));
            }
            Ok(())
        }
        StateCommands::Get { path } => {
            let parsed: StatePath = path.parse()?;
            let state = open_state(ctx, None)?;
            let value = state.get(parsed).unwrap_or(Value::Null);
            out.data(&serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        StateCommands::Set { path, value } => {
            let parsed: StatePath = path.parse()?;
            let state = open_state(ctx, Some(path))?;
            let value = parse_value(value);
            if !state.set(parsed, value, false) {
                return Err(dockdb::Error::InvalidStateValue {
                    path: path.clone(),
                    reason: "value does not match the field's type".to_string(),
                }
                .into());
            }
            out.success(&format!("Set {}", parsed));
            Ok(())
        }
        StateCommands::Reset => {
            let prefix = &ctx.config.state.persistence_prefix;
            let mut removed = 0;
            for path in stored_paths(ctx)? {
                if ctx.storage.remove_item(&format!("{}.{}", prefix, path))? {
                    removed += 1;
                }
            }
            out.success(&format!("Removed {} persisted state value(s)", removed));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::JsonFlag;
    use crate::commands::test_support::{memory_context, RecordingOutput};

    #[test]
    fn test_set_then_get() {
        let (ctx, store) = memory_context();
        let out = RecordingOutput::default();

        run_state(
            &StateCommands::Set {
                path: "ui.activeTab".to_string(),
                value: "images".to_string(),
            },
            &ctx,
            &out,
        )
        .unwrap();
        assert_eq!(
            store.get_item("docker-db-manager.ui.activeTab").unwrap().as_deref(),
            Some("\"images\"")
        );

        let out = RecordingOutput::default();
        run_state(
            &StateCommands::Get {
                path: "ui.activeTab".to_string(),
            },
            &ctx,
            &out,
        )
        .unwrap();
        assert_eq!(out.text(), "\"images\"");
    }

    #[test]
    fn test_set_rejects_unknown_path_and_bad_shape() {
        let (ctx, _store) = memory_context();
        let out = RecordingOutput::default();

        let unknown = StateCommands::Set {
            path: "ui.nope".to_string(),
            value: "1".to_string(),
        };
        assert!(run_state(&unknown, &ctx, &out).is_err());

        let wrong_shape = StateCommands::Set {
            path: "data.allContainers".to_string(),
            value: "42".to_string(),
        };
        assert!(run_state(&wrong_shape, &ctx, &out).is_err());
    }

    #[test]
    fn test_reset_removes_only_state_keys() {
        let (ctx, store) = memory_context();
        store.set_item("docker-db-manager.ui.activeTab", "\"images\"").unwrap();
        store.set_item("docker-db-favorites", "[\"a\"]").unwrap();

        let out = RecordingOutput::default();
        run_state(&StateCommands::Reset, &ctx, &out).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["docker-db-favorites".to_string()]);

        let out = RecordingOutput::default();
        run_state(&StateCommands::Show(JsonFlag { json: true }), &ctx, &out).unwrap();
        assert!(out.text().contains("\"activeTab\": \"dashboard\""));
    }
}
