//! Top-level configuration file

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use butler_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use super::GameSyncSpec;
use crate::{Error, Result};

/// File name looked up when no explicit config path is given
pub const DEFAULT_CONFIG_FILE: &str = "deck-save-butler.json";

const APP_DIR: &str = "deck-save-butler";

fn default_concurrency() -> usize {
    2
}

/// How paths modified on both endpoints are arbitrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The strictly newer modification time wins; ties are left to the user.
    #[default]
    NewerWins,
    /// The PC state always wins.
    PreferPc,
    /// The Deck state always wins.
    PreferDeck,
    /// Never arbitrate automatically.
    Manual,
}

/// Parsed configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButlerConfig {
    /// Consumed by the CLI: sync everything when started without a command
    #[serde(default, alias = "auto_sync")]
    pub auto_sync: bool,

    /// Maximum number of games synchronized at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Where LastSynced baselines are stored
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Re-hash every file instead of trusting unchanged size and mtime
    #[serde(default)]
    pub verify_hashes: bool,

    #[serde(default)]
    pub games: Vec<GameSyncSpec>,

    /// Directory of the loaded file; relative paths resolve against it
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for ButlerConfig {
    fn default() -> Self {
        Self {
            auto_sync: false,
            concurrency: default_concurrency(),
            state_dir: None,
            conflict_policy: ConflictPolicy::default(),
            verify_hashes: false,
            games: Vec::new(),
            base_dir: None,
        }
    }
}

impl ButlerConfig {
    /// Load and validate a configuration file (format chosen by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: ButlerConfig = ConfigStore::new().load(&NormalizedPath::new(path))?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        config.validate()?;
        tracing::debug!(?path, games = config.games.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate JSON content.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ButlerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn game(&self, id: u64) -> Option<&GameSyncSpec> {
        self.games.iter().find(|g| g.id == id)
    }

    /// Directory holding the per-game LastSynced baselines.
    ///
    /// An explicit `stateDir` is resolved against the config file's directory.
    /// Otherwise the platform data directory is used.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return match &self.base_dir {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir.clone(),
            };
        }
        match dirs::data_local_dir() {
            Some(data) => data.join(APP_DIR).join("state"),
            None => self
                .base_dir
                .clone()
                .unwrap_or_default()
                .join(format!(".{APP_DIR}")),
        }
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }

        let mut ids = HashSet::new();
        let mut endpoint_owner: HashMap<String, u64> = HashMap::new();

        for game in &self.games {
            if !ids.insert(game.id) {
                return Err(Error::config(format!("duplicate game id {}", game.id)));
            }
            if game.name.trim().is_empty() {
                return Err(Error::config(format!("game {} has an empty name", game.id)));
            }
            for (label, value) in [("pcPath", &game.pc_path), ("deckPath", &game.deck_path)] {
                if value.trim().is_empty() {
                    return Err(Error::config(format!("game {} has an empty {}", game.id, label)));
                }
            }

            let pc = endpoint_key(&game.pc_path);
            let deck = endpoint_key(&game.deck_path);
            if pc == deck {
                return Err(Error::config(format!(
                    "game {} uses the same directory for pcPath and deckPath",
                    game.id
                )));
            }
            for key in [pc, deck] {
                if let Some(owner) = endpoint_owner.insert(key.clone(), game.id) {
                    return Err(Error::config(format!(
                        "games {} and {} share the endpoint directory {}",
                        owner, game.id, key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn endpoint_key(raw: &str) -> String {
    let normalized = NormalizedPath::new(raw.trim());
    let s = normalized.as_str();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}
