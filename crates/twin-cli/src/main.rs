use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use twin_cli::commands::{journal, recall, rules, sense, timeline};
use twin_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Sense { hours, dry_run }) => {
            let config = load_config(cli.config.as_deref())?;
            sense::run(&config, *hours, *dry_run)?;
        }
        Some(Commands::Timeline { json, keep }) => {
            let config = load_config(cli.config.as_deref())?;
            timeline::run(&config, *json, *keep)?;
        }
        Some(Commands::Journal { no_ingest }) => {
            let config = load_config(cli.config.as_deref())?;
            journal::run(&config, *no_ingest)?;
        }
        Some(Commands::Recall {
            query,
            top,
            before,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            recall::run(&config, query, *top, before.as_deref(), *json)?;
        }
        Some(Commands::Rules { json }) => {
            let config = load_config(cli.config.as_deref())?;
            rules::run(&config, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
