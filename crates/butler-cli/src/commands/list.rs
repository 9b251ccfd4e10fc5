//! List command implementation

use std::path::Path;

use butler_core::{FileFilter, LastSyncedStore};
use colored::Colorize;

use super::load_config;
use crate::error::Result;

/// Print every configured game with its endpoints and baseline state.
pub fn run_list(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let store = LastSyncedStore::new(config.state_dir());

    if config.games.is_empty() {
        println!("No games configured in {}.", config_path.display());
        return Ok(());
    }

    for game in &config.games {
        println!("{} {}", format!("#{}", game.id).dimmed(), game.name.cyan().bold());
        println!("   PC:    {}", game.pc_path);
        println!("   Deck:  {}", game.deck_path);
        let files = match &game.file_filter {
            FileFilter::AllFiles => "all files".to_string(),
            FileFilter::ExplicitList(paths) => paths
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!("   Files: {}", files);
        let synced = match store.load(game.id) {
            Ok(Some(record)) => record.synced_at.to_rfc3339().green(),
            Ok(None) => "never".yellow(),
            Err(e) => format!("unreadable ({e})").red(),
        };
        println!("   Last synced: {}", synced);
    }
    Ok(())
}
