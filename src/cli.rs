use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockdb")]
#[command(about = "dockdb - inspect and edit the database manager's stored state and preferences")]
pub struct Cli {
    /// Config file path (defaults to dockdb.yaml, searched upward)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file (overrides storage.path from the config)
    #[arg(short, long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or edit persisted application state
    #[command(subcommand)]
    State(StateCommands),
    /// Manage favorite containers
    #[command(subcommand)]
    Favorites(FavoritesCommands),
    /// Manage custom database templates
    #[command(subcommand)]
    Templates(TemplatesCommands),
    /// Create or check the runtime configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// Print the state tree with persisted values applied
    Show(JsonFlag),
    /// Print the value at a state path (e.g. ui.activeTab)
    Get {
        path: String,
    },
    /// Store a JSON value at a state path
    Set {
        path: String,
        /// JSON value; bare words are taken as strings
        value: String,
    },
    /// Remove every persisted state value
    Reset,
}

#[derive(Subcommand)]
pub enum FavoritesCommands {
    /// List favorite container ids
    List(JsonFlag),
    /// Mark a container as favorite
    Add { container_id: String },
    /// Unmark a container
    Remove { container_id: String },
    /// Flip a container's favorite flag
    Toggle { container_id: String },
    /// Remove all favorites
    Clear,
}

#[derive(Subcommand)]
pub enum TemplatesCommands {
    /// List custom templates
    List(JsonFlag),
    /// Print one template as JSON
    Export { id: String },
    /// Save a template from an exported JSON file
    Import { file: PathBuf },
    /// Delete a custom template
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a starter dockdb.yaml
    Init {
        /// Output path
        #[arg(short, long, default_value = "dockdb.yaml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the configuration
    Validate,
    /// Print the effective configuration
    Show,
}

#[derive(Args)]
pub struct JsonFlag {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
