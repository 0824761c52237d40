mod cli;
mod commands;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use tsync_config::Config;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            init_tracing(None)?;
            commands::init::handle(config_path, force)
        }
        Commands::Sync {
            dry_run,
            concurrency,
            json,
        } => {
            let config = setup(config_path)?;
            commands::sync::handle(&config, dry_run, concurrency, json).await
        }
        Commands::Scan { text, show_values } => {
            let config = setup(config_path)?;
            commands::scan::handle(&config, text, show_values)
        }
        Commands::Rules => {
            let config = setup(config_path)?;
            commands::rules::handle(&config)
        }
    }
}

fn setup(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load(config_path)?;
    init_tracing(config.log.file.as_deref())?;
    Ok(config)
}

/// Logs go to stderr (stdout carries command output), plus an optional
/// plain-text log file.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
