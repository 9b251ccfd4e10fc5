//! Save synchronization engine for Deck Save Butler
//!
//! Keeps one game's save directory identical on two machines, a PC and a
//! Steam Deck, using a three-way comparison against the state both sides
//! agreed on after the previous sync:
//!
//! - **Configuration**: [`ButlerConfig`] with one [`GameSyncSpec`] per game
//! - **Resolution**: [`PathResolver`] checks and canonicalizes both endpoints
//! - **Snapshots**: [`Snapshotter`] builds a [`Manifest`] per endpoint
//! - **Analysis**: [`DivergenceAnalyzer`] classifies every path, [`ConflictResolver`] picks actions
//! - **Execution**: [`TransferExecutor`] applies the plan with staged copies
//! - **Baselines**: [`LastSyncedStore`] keeps one record per game
//!
//! [`SyncOrchestrator`] ties the stages together and runs games concurrently.
//!
//! # Example
//!
//! ```ignore
//! use butler_core::{ButlerConfig, CancellationFlag, SyncOptions, SyncOrchestrator};
//!
//! async fn run(config: &ButlerConfig) {
//!     let orchestrator = SyncOrchestrator::from_config(config);
//!     let run = orchestrator
//!         .run_all(&config.games, SyncOptions::default(), &CancellationFlag::new())
//!         .await;
//!     for report in &run.reports {
//!         println!("{}: {:?}", report.game_name, report.status);
//!     }
//! }
//! ```

pub mod baseline;
pub mod config;
pub mod error;
pub mod resolver;
pub mod snapshot;
pub mod sync;

pub use baseline::{BASELINE_VERSION, BaselineRecord, LastSyncedStore};
pub use config::{ButlerConfig, ConflictPolicy, DEFAULT_CONFIG_FILE, FileFilter, GameSyncSpec};
pub use error::{Error, Result};
pub use resolver::{Endpoint, PathResolver, ResolvedGame};
pub use snapshot::{FileManifestEntry, Manifest, ScanOutcome, Snapshotter};
pub use sync::{
    ActionCounts, CancellationFlag, ConflictResolver, DivergenceAnalyzer, DivergenceClass,
    PathError, PlanEntry, RunReport, RunStatus, SyncAction, SyncOptions, SyncOrchestrator,
    SyncPlan, SyncReport, SyncStatus, TransferExecutor,
};
