//! Endpoint snapshots
//!
//! A [`Manifest`] records size, modification time and content fingerprint of
//! every tracked file below one endpoint root. The [`Snapshotter`] builds it.

mod manifest;
mod scanner;

pub use manifest::{FileManifestEntry, MTIME_TOLERANCE_SECS, Manifest};
pub(crate) use manifest::same_state as manifest_same_state;
pub use scanner::{ScanOutcome, Snapshotter};
