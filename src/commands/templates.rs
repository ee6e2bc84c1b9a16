use super::Context;
use crate::cli::TemplatesCommands;
use crate::output::UserOutput;
use dockdb::preferences::TemplateStore;
use std::sync::Arc;

pub fn run_templates(cmd: &TemplatesCommands, ctx: &Context, out: &dyn UserOutput) -> anyhow::Result<()> {
    let templates = TemplateStore::load(Arc::clone(&ctx.storage));

    match cmd {
        TemplatesCommands::List(flags) => {
            let list = templates.list();
            if flags.json {
                out.data(&serde_json::to_string_pretty(&list)?);
                return Ok(());
            }
            if list.is_empty() {
                out.status("No custom templates");
                return Ok(());
            }
            for template in list {
                let engines: Vec<&str> = template.configurations.keys().map(String::as_str).collect();
                out.status(&format!(
                    "{:<24} {:<24} [{}]",
                    template.id.as_deref().unwrap_or("-"),
                    template.name,
                    engines.join(", ")
                ));
            }
        }
        TemplatesCommands::Export { id } => {
            out.data(&templates.export(id)?);
        }
        TemplatesCommands::Import { file } => {
            let contents = std::fs::read_to_string(file)?;
            let id = templates.import(&contents)?;
            out.success(&format!("Imported template {}", id));
        }
        TemplatesCommands::Delete { id } => {
            if templates.delete(id)? {
                out.success(&format!("Deleted template {}", id));
            } else {
                return Err(dockdb::Error::TemplateNotFound(id.clone()).into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_context, RecordingOutput};
    use std::io::Write;

    #[test]
    fn test_import_list_delete() {
        let (ctx, _store) = memory_context();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"id": "small", "name": "Small", "configurations": {{"redis": {{"memory": "64m"}}}}}}"#
        )
        .unwrap();

        let out = RecordingOutput::default();
        run_templates(
            &TemplatesCommands::Import {
                file: file.path().to_path_buf(),
            },
            &ctx,
            &out,
        )
        .unwrap();
        assert!(out.text().contains("Imported template small"));

        let delete = TemplatesCommands::Delete {
            id: "small".to_string(),
        };
        run_templates(&delete, &ctx, &out).unwrap();
        assert!(run_templates(&delete, &ctx, &out).is_err());
    }
}
