//! The synchronization pipeline
//!
//! Classification ([`DivergenceAnalyzer`]) and conflict arbitration
//! ([`ConflictResolver`]) are pure functions over manifests. Only the
//! [`TransferExecutor`] touches endpoint files, and only the
//! [`SyncOrchestrator`] writes the LastSynced store.

mod cancel;
mod conflict;
mod divergence;
mod executor;
mod orchestrator;
mod plan;
mod report;

pub use cancel::CancellationFlag;
pub use conflict::ConflictResolver;
pub use divergence::{DivergenceAnalyzer, DivergenceClass, classify};
pub use executor::{ExecutionOutcome, TransferExecutor};
pub use orchestrator::{SyncOptions, SyncOrchestrator};
pub use plan::{PlannedAction, SyncAction, SyncPlan};
pub use report::{
    ActionCounts, PathError, PlanEntry, RunReport, RunStatus, SyncReport, SyncStatus,
};
