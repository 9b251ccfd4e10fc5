//! Configuration model
//!
//! The on-disk schema is camelCase JSON (TOML and YAML are accepted too):
//! a global `autoSync` switch, engine tuning, and the list of games.

mod game;
mod settings;

pub use game::{FileFilter, GameSyncSpec};
pub use settings::{ButlerConfig, ConflictPolicy, DEFAULT_CONFIG_FILE};
