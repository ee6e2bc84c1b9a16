mod cli;
mod commands;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, ConfigCommands};
use commands::Context;
use dockdb::Error as DockError;

fn main() {
    if let Err(e) = run() {
        if let Some(dock_error) = e.downcast_ref::<DockError>() {
            eprintln!("Error: {}", dock_error);
            if let Some(suggestion) = dock_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let out = output::CliOutput;

    // Commands that need no storage
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Config(ConfigCommands::Init { output, force }) => {
            return commands::run_config_init(output, *force, &out);
        }
        Commands::Config(ConfigCommands::Validate) => {
            return commands::run_config_validate(cli.config.clone(), &out);
        }
        Commands::Config(ConfigCommands::Show) => {
            return commands::run_config_show(cli.config.clone(), &out);
        }
        _ => {}
    }

    let ctx = Context::load(cli.config.clone(), cli.storage.clone())?;
    match &cli.command {
        Commands::State(cmd) => commands::run_state(cmd, &ctx, &out),
        Commands::Favorites(cmd) => commands::run_favorites(cmd, &ctx, &out),
        Commands::Templates(cmd) => commands::run_templates(cmd, &ctx, &out),
        Commands::Completions { .. } | Commands::Config(_) => Ok(()),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
