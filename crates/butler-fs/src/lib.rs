//! Filesystem primitives for Deck Save Butler
//!
//! Provides normalized path handling, content fingerprints and the atomic
//! write/copy operations the sync engine relies on.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::{RobustnessConfig, StageOptions};
pub use path::{NormalizedPath, RelativePath};
