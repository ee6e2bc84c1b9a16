use super::Context;
use crate::cli::FavoritesCommands;
use crate::output::UserOutput;
use dockdb::preferences::FavoritesStore;
use std::sync::Arc;

pub fn run_favorites(cmd: &FavoritesCommands, ctx: &Context, out: &dyn UserOutput) -> anyhow::Result<()> {
    let favorites = FavoritesStore::load(Arc::clone(&ctx.storage));

    match cmd {
        FavoritesCommands::List(flags) => {
            let ids = favorites.list();
            if flags.json {
                out.data(&serde_json::to_string_pretty(&ids)?);
            } else if ids.is_empty() {
                out.status("No favorites");
            } else {
                for id in ids {
                    out.status(&id);
                }
            }
        }
        FavoritesCommands::Add { container_id } => {
            if favorites.add(container_id) {
                out.success(&format!("Added {} to favorites", container_id));
            } else {
                out.warning(&format!("{} is already a favorite", container_id));
            }
        }
        FavoritesCommands::Remove { container_id } => {
            if favorites.remove(container_id) {
                out.success(&format!("Removed {} from favorites", container_id));
            } else {
                out.warning(&format!("{} is not a favorite", container_id));
            }
        }
        FavoritesCommands::Toggle { container_id } => {
            let now = if favorites.toggle(container_id) {
                "favorite"
            } else {
                "not a favorite"
            };
            out.success(&format!("{} is now {}", container_id, now));
        }
        FavoritesCommands::Clear => {
            let count = favorites.count();
            favorites.clear();
            out.success(&format!("Cleared {} favorite(s)", count));
        }
    }
    Ok(())
}
