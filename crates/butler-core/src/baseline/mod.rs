//! LastSynced baseline persistence
//!
//! Each game owns one record file, `game-<id>.json`, below the state
//! directory. Games never share a record, so concurrent passes for
//! different games never contend on the store.

use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use butler_fs::io::{self, RobustnessConfig};
use butler_fs::NormalizedPath;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::snapshot::Manifest;
use crate::{Error, Result};

/// Current on-disk record version
pub const BASELINE_VERSION: u32 = 1;

/// The persisted state both endpoints agreed on after the last convergence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRecord {
    pub version: u32,
    pub game_id: u64,
    pub game_name: String,
    pub synced_at: DateTime<Utc>,
    pub manifest: Manifest,
}

impl BaselineRecord {
    pub fn new(game_id: u64, game_name: impl Into<String>, manifest: Manifest) -> Self {
        Self {
            version: BASELINE_VERSION,
            game_id,
            game_name: game_name.into(),
            synced_at: Utc::now(),
            manifest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LastSyncedStore {
    dir: PathBuf,
    robustness: RobustnessConfig,
}

impl LastSyncedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, game_id: u64) -> PathBuf {
        self.dir.join(format!("game-{game_id}.json"))
    }

    pub fn exists(&self, game_id: u64) -> bool {
        self.record_path(game_id).is_file()
    }

    /// Load a game's baseline. `Ok(None)` means the game was never synced.
    pub fn load(&self, game_id: u64) -> Result<Option<BaselineRecord>> {
        let path = self.record_path(game_id);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(game_id, format!("{}: {e}", path.display()))),
        };

        FileExt::lock_shared(&file)
            .map_err(|e| store_error(game_id, format!("cannot lock {}: {e}", path.display())))?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        let _ = FileExt::unlock(&file);
        read.map_err(|e| store_error(game_id, format!("{}: {e}", path.display())))?;

        let record: BaselineRecord = serde_json::from_str(&content)
            .map_err(|e| store_error(game_id, format!("corrupt baseline {}: {e}", path.display())))?;
        if record.version != BASELINE_VERSION {
            return Err(store_error(
                game_id,
                format!("unsupported baseline version {}", record.version),
            ));
        }
        if record.game_id != game_id {
            return Err(store_error(
                game_id,
                format!("record belongs to game {}", record.game_id),
            ));
        }

        tracing::debug!(game_id, files = record.manifest.len(), "Loaded baseline");
        Ok(Some(record))
    }

    pub fn save(&self, record: &BaselineRecord) -> Result<()> {
        let path = self.record_path(record.game_id);
        let content = serde_json::to_string_pretty(record)?;
        io::write_atomic(&NormalizedPath::new(&path), content.as_bytes(), self.robustness)
            .map_err(|e| store_error(record.game_id, e))?;
        tracing::debug!(
            game_id = record.game_id,
            files = record.manifest.len(),
            "Saved baseline"
        );
        Ok(())
    }

    /// Forget a game's baseline. Returns whether one existed.
    pub fn remove(&self, game_id: u64) -> Result<bool> {
        let path = self.record_path(game_id);
        let removed = io::remove_file(&path).map_err(|e| store_error(game_id, e))?;
        let lock = PathBuf::from(format!("{}.lock", path.display()));
        if let Err(e) = fs::remove_file(&lock)
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!(path = ?lock, error = %e, "Could not remove baseline lock file");
        }
        Ok(removed)
    }
}

fn store_error(game_id: u64, message: impl ToString) -> Error {
    Error::BaselineStore {
        game_id,
        message: message.to_string(),
    }
}
