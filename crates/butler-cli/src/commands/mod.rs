//! Command implementations for butler-cli

pub mod list;
pub mod reset;
pub mod sync;

mod render;

use std::path::Path;

use butler_core::{ButlerConfig, GameSyncSpec};

use crate::cli::GameSelection;
use crate::error::{CliError, Result};

pub use list::run_list;
pub use reset::run_reset;
pub use sync::{SyncRequest, run_sync};

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<ButlerConfig> {
    if !path.is_file() {
        return Err(CliError::user(format!(
            "Config file not found: {} (use --config or BUTLER_CONFIG)",
            path.display()
        )));
    }
    Ok(ButlerConfig::load(path)?)
}

/// The games a command applies to, in configuration order.
pub fn select_games(config: &ButlerConfig, selection: &GameSelection) -> Result<Vec<GameSyncSpec>> {
    if let Some(unknown) = selection.games.iter().find(|id| config.game(**id).is_none()) {
        return Err(CliError::user(format!("Unknown game id: {unknown}")));
    }
    Ok(config
        .games
        .iter()
        .filter(|game| selection.games.is_empty() || selection.games.contains(&game.id))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ButlerConfig {
        ButlerConfig::from_json(
            r#"{"games": [
                {"_id": 1, "name": "A", "pcPath": "/pc/a", "deckPath": "/deck/a"},
                {"_id": 2, "name": "B", "pcPath": "/pc/b", "deckPath": "/deck/b"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_selection_takes_every_game() {
        let games = select_games(&config(), &GameSelection::default()).unwrap();
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn selection_keeps_configuration_order() {
        let selection = GameSelection { games: vec![2, 1] };
        let ids: Vec<u64> = select_games(&config(), &selection)
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn unknown_game_is_a_user_error() {
        let selection = GameSelection { games: vec![9] };
        let err = select_games(&config(), &selection).unwrap_err();
        assert!(err.to_string().contains("Unknown game id: 9"));
    }

    #[test]
    fn missing_config_file_is_a_user_error() {
        let err = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }
}
