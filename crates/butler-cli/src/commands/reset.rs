//! Reset command implementation

use std::path::Path;

use butler_core::LastSyncedStore;
use colored::Colorize;

use super::load_config;
use crate::error::{CliError, Result};

/// Remove the LastSynced baseline of one game.
pub fn run_reset(config_path: &Path, id: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let game = config
        .game(id)
        .ok_or_else(|| CliError::user(format!("Unknown game id: {id}")))?;
    let store = LastSyncedStore::new(config.state_dir());

    if store.remove(id)? {
        println!(
            "{} Forgot last synced state of {}.",
            "OK".green().bold(),
            game.name.cyan()
        );
    } else {
        println!("{} {} has never been synced.", "OK".green().bold(), game.name.cyan());
    }
    Ok(())
}
