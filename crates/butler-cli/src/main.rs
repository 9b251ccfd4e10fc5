//! Deck Save Butler CLI
//!
//! Syncs game saves between a PC and a Steam Deck.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::Path;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, GameSelection};
use commands::SyncRequest;
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but the outcome calls for a
/// non-zero exit code.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!(config = ?cli.config, "Starting");

    match cli.command {
        Some(Commands::Sync {
            selection,
            dry_run,
            json,
            concurrency,
        }) => commands::run_sync(
            &cli.config,
            &selection,
            SyncRequest {
                dry_run,
                json,
                concurrency,
            },
        ),
        Some(Commands::Status { selection, json }) => commands::run_sync(
            &cli.config,
            &selection,
            SyncRequest {
                dry_run: true,
                json,
                concurrency: None,
            },
        ),
        Some(Commands::List) => commands::run_list(&cli.config).map(|()| true),
        Some(Commands::Reset { id }) => commands::run_reset(&cli.config, id).map(|()| true),
        None => run_default(&cli.config),
    }
}

/// No subcommand: sync everything when the config asks for it.
fn run_default(config_path: &Path) -> Result<bool> {
    if config_path.is_file() {
        let config = commands::load_config(config_path)?;
        if config.auto_sync {
            return commands::run_sync(config_path, &GameSelection::default(), SyncRequest::default());
        }
    }

    println!("{} Deck Save Butler", "butler".green().bold());
    println!();
    println!("Run {} to sync your saves.", "butler sync".cyan());
    println!("Set {} in the config to sync on start.", "\"autoSync\": true".cyan());
    println!("Run {} for available commands.", "butler --help".cyan());
    Ok(true)
}
