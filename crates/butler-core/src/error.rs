//! Error types for butler-core

use std::path::PathBuf;

/// Result type for butler-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in butler-core operations
///
/// None of these abort a multi-game run: the orchestrator folds them into the
/// affected game's [`SyncReport`](crate::SyncReport).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured endpoint directory cannot be read or created
    #[error("Path unavailable: {path}: {reason}")]
    PathUnavailable { path: PathBuf, reason: String },

    /// Both endpoints resolve to the same directory
    #[error("PC and Deck paths resolve to the same directory: {path}")]
    SameEndpoint { path: PathBuf },

    /// One endpoint is nested inside the other
    #[error("Endpoints overlap: {pc} and {deck}")]
    OverlappingEndpoints { pc: PathBuf, deck: PathBuf },

    /// A directory walk failed partway
    #[error("Scan of {root} failed: {message}")]
    Scan { root: PathBuf, message: String },

    /// A single file copy or delete failed
    #[error("Transfer failed for {path}: {message}")]
    Transfer { path: PathBuf, message: String },

    /// The LastSynced store could not be read or written
    #[error("Baseline store error for game {game_id}: {message}")]
    BaselineStore { game_id: u64, message: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// The run was cancelled before this step
    #[error("Sync cancelled")]
    Cancelled,

    /// Filesystem error from butler-fs
    #[error(transparent)]
    Fs(#[from] butler_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn scan(root: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Scan {
            root: root.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }
}
