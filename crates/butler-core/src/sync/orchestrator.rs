//! Per-game pipeline and the bounded multi-game run
//!
//! One pass for one game runs Resolver, two concurrent scans, analysis,
//! conflict resolution and execution, then re-scans both endpoints and
//! persists the agreed state as the new LastSynced baseline. Filesystem work
//! happens on the blocking pool; games run as independent tasks bounded by a
//! semaphore.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::cancel::CancellationFlag;
use super::conflict::ConflictResolver;
use super::divergence::DivergenceAnalyzer;
use super::executor::TransferExecutor;
use super::report::{ReportBuilder, RunReport, SyncReport};
use crate::baseline::{BaselineRecord, LastSyncedStore};
use crate::config::{ButlerConfig, ConflictPolicy, GameSyncSpec};
use crate::resolver::{PathResolver, ResolvedGame};
use crate::snapshot::{Manifest, ScanOutcome, Snapshotter};
use crate::{Error, Result};

/// Options for a sync run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Plan only: no directory creation, no transfers, no baseline write.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
struct Settings {
    store: LastSyncedStore,
    policy: ConflictPolicy,
    verify_hashes: bool,
    concurrency: usize,
    base_dir: Option<PathBuf>,
    fsync: bool,
}

/// Drives sync passes for one or many games.
///
/// Cheap to clone; clones share settings.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    settings: Arc<Settings>,
}

impl SyncOrchestrator {
    pub fn new(store: LastSyncedStore) -> Self {
        Self {
            settings: Arc::new(Settings {
                store,
                policy: ConflictPolicy::default(),
                verify_hashes: false,
                concurrency: 2,
                base_dir: None,
                fsync: true,
            }),
        }
    }

    /// Orchestrator carrying every engine setting of `config`.
    pub fn from_config(config: &ButlerConfig) -> Self {
        let mut orchestrator = Self::new(LastSyncedStore::new(config.state_dir()))
            .conflict_policy(config.conflict_policy)
            .verify_hashes(config.verify_hashes)
            .concurrency(config.concurrency);
        if let Some(base) = config.base_dir() {
            orchestrator = orchestrator.base_dir(base);
        }
        orchestrator
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        Arc::make_mut(&mut self.settings).policy = policy;
        self
    }

    pub fn verify_hashes(mut self, verify: bool) -> Self {
        Arc::make_mut(&mut self.settings).verify_hashes = verify;
        self
    }

    /// Maximum number of games synced at once; clamped to at least 1.
    pub fn concurrency(mut self, limit: usize) -> Self {
        Arc::make_mut(&mut self.settings).concurrency = limit.max(1);
        self
    }

    /// Directory relative endpoint paths are resolved against.
    pub fn base_dir(mut self, base: impl Into<PathBuf>) -> Self {
        Arc::make_mut(&mut self.settings).base_dir = Some(base.into());
        self
    }

    pub fn fsync(mut self, fsync: bool) -> Self {
        Arc::make_mut(&mut self.settings).fsync = fsync;
        self
    }

    pub fn store(&self) -> &LastSyncedStore {
        &self.settings.store
    }

    /// Sync every game, at most `concurrency` at a time.
    ///
    /// Reports come back in input order. A game's failure, even a panic in
    /// its task, never affects another game's report.
    pub async fn run_all(
        &self,
        specs: &[GameSyncSpec],
        options: SyncOptions,
        cancel: &CancellationFlag,
    ) -> RunReport {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut tasks = JoinSet::new();

        for (index, spec) in specs.iter().cloned().enumerate() {
            let this = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, this.sync_game(&spec, options, &cancel).await)
            });
        }

        let mut slots: Vec<Option<SyncReport>> = vec![None; specs.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => tracing::error!(error = %e, "Game sync task failed"),
            }
        }

        let reports = slots
            .into_iter()
            .zip(specs)
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| SyncReport::failed(spec, "sync task ended abnormally"))
            })
            .collect();
        let run = RunReport::new(reports);
        tracing::info!(status = ?run.status, games = run.reports.len(), "Run finished");
        run
    }

    /// Run one pass for one game. Never fails: problems land in the report.
    pub async fn sync_game(
        &self,
        spec: &GameSyncSpec,
        options: SyncOptions,
        cancel: &CancellationFlag,
    ) -> SyncReport {
        let report = ReportBuilder::new(spec, options.dry_run);
        if cancel.is_cancelled() {
            tracing::info!(game_id = spec.id, "Skipping game, run cancelled");
            return report.cancelled(true).finish();
        }

        tracing::info!(game_id = spec.id, name = %spec.name, dry_run = options.dry_run, "Syncing game");
        let report = self.pass(spec, options, cancel, report).await;
        tracing::info!(
            game_id = spec.id,
            status = ?report.status,
            copies = report.counts.copies(),
            deletions = report.counts.deletions(),
            conflicts = report.conflicts.len(),
            errors = report.errors.len(),
            "Game finished"
        );
        report
    }

    async fn pass(
        &self,
        spec: &GameSyncSpec,
        options: SyncOptions,
        cancel: &CancellationFlag,
        report: ReportBuilder,
    ) -> SyncReport {
        let resolver = PathResolver::new(self.settings.base_dir.clone()).dry_run(options.dry_run);
        let owned = spec.clone();
        let game = match blocking(move || resolver.resolve(&owned)).await {
            Ok(game) => game,
            Err(e) => {
                tracing::warn!(game_id = spec.id, error = %e, "Endpoints unavailable");
                return report.game_error(e).finish();
            }
        };

        let store = self.settings.store.clone();
        let id = spec.id;
        let baseline = match blocking(move || store.load(id)).await {
            Ok(record) => record.map(|r| r.manifest),
            Err(e) => {
                tracing::warn!(game_id = spec.id, error = %e, "Baseline unreadable");
                return report.game_error(e).finish();
            }
        };

        let (pc, deck) = self.scan_both(&game, baseline.as_ref(), baseline.as_ref()).await;
        let (pc, deck) = match (pc, deck) {
            (Ok(pc), Ok(deck)) => (pc, deck),
            (pc, deck) => {
                let partial = pc.is_ok() || deck.is_ok();
                let message = [pc.err(), deck.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(game_id = spec.id, %message, "Scan failed");
                return report.game_error(message).partial_scan(partial).finish();
            }
        };
        tracing::debug!(
            game_id = spec.id,
            pc_files = pc.manifest.len(),
            deck_files = deck.manifest.len(),
            reused = pc.reused_fingerprints + deck.reused_fingerprints,
            "Scanned endpoints"
        );

        let classes = DivergenceAnalyzer.analyze(&pc.manifest, &deck.manifest, baseline.as_ref());
        let plan = ConflictResolver::new(self.settings.policy).plan(&classes, &pc.manifest, &deck.manifest);
        let report = report.plan(&plan);
        let has_conflicts = !plan.conflicts().is_empty();

        if options.dry_run {
            return report.finish();
        }
        if cancel.is_cancelled() {
            return report.cancelled(true).finish();
        }

        let executor = TransferExecutor::new(&game)
            .fsync(self.settings.fsync)
            .with_cancellation(cancel.clone());
        let stale: Vec<PathBuf> = pc
            .stale_staging
            .iter()
            .chain(&deck.stale_staging)
            .cloned()
            .collect();
        let (pc_before, deck_before) = (pc.manifest, deck.manifest);
        let outcome = {
            let (pc_manifest, deck_manifest) = (pc_before.clone(), deck_before.clone());
            blocking(move || {
                executor.sweep_staging(&stale);
                Ok(executor.execute(&plan, &pc_manifest, &deck_manifest))
            })
            .await
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => return report.executed(&[], Vec::new()).game_error(e).finish(),
        };

        let clean = outcome.errors.is_empty() && !outcome.cancelled;
        let report = report
            .executed(&outcome.completed, outcome.errors)
            .cancelled(outcome.cancelled || cancel.is_cancelled());
        if has_conflicts || !clean || cancel.is_cancelled() {
            tracing::debug!(game_id = spec.id, "Baseline not updated");
            return report.finish();
        }

        // Re-scan instead of trusting the plan: timestamps may have been
        // rounded by the destination filesystem.
        let (pc_after, deck_after) = self.scan_both(&game, Some(&pc_before), Some(&deck_before)).await;
        let agreed = match (pc_after, deck_after) {
            (Ok(pc), Ok(deck)) => pc.manifest.agreed_with(&deck.manifest),
            (Err(e), _) | (_, Err(e)) => return report.game_error(e).finish(),
        };

        let store = self.settings.store.clone();
        let record = BaselineRecord::new(spec.id, spec.name.clone(), agreed);
        match blocking(move || store.save(&record)).await {
            Ok(()) => report.baseline_saved(true).finish(),
            Err(e) => {
                tracing::warn!(game_id = spec.id, error = %e, "Baseline not saved");
                report.game_error(e).finish()
            }
        }
    }

    async fn scan_both(
        &self,
        game: &ResolvedGame,
        pc_hint: Option<&Manifest>,
        deck_hint: Option<&Manifest>,
    ) -> (Result<ScanOutcome>, Result<ScanOutcome>) {
        let snapshotter = Snapshotter::new(game.filter.clone()).verify_hashes(self.settings.verify_hashes);
        let scan = |root: PathBuf, hint: Option<Manifest>| {
            let snapshotter = snapshotter.clone();
            blocking(move || snapshotter.scan(&root, hint.as_ref()))
        };
        tokio::join!(
            scan(game.pc_root.clone(), pc_hint.cloned()),
            scan(game.deck_root.clone(), deck_hint.cloned()),
        )
    }
}

/// Run filesystem work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
