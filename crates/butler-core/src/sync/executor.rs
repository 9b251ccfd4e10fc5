//! Applies a plan to the two endpoints
//!
//! Copies are staged next to the destination and renamed into place, so a
//! destination path never holds a half-written file. Every path is
//! independent: a failure is recorded and execution moves on.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use butler_fs::RelativePath;
use butler_fs::io::{self, StageOptions};
use chrono::{DateTime, Utc};

use super::cancel::CancellationFlag;
use super::plan::{SyncAction, SyncPlan};
use super::report::PathError;
use crate::resolver::{Endpoint, ResolvedGame};
use crate::snapshot::{FileManifestEntry, Manifest};
use crate::{Error, Result};

/// What happened while executing a plan
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub completed: Vec<(RelativePath, SyncAction)>,
    pub errors: Vec<PathError>,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct TransferExecutor {
    pc_root: PathBuf,
    deck_root: PathBuf,
    fsync: bool,
    cancel: CancellationFlag,
}

impl TransferExecutor {
    pub fn new(game: &ResolvedGame) -> Self {
        Self {
            pc_root: game.pc_root.clone(),
            deck_root: game.deck_root.clone(),
            fsync: true,
            cancel: CancellationFlag::default(),
        }
    }

    pub fn fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    fn root(&self, endpoint: Endpoint) -> &Path {
        match endpoint {
            Endpoint::Pc => &self.pc_root,
            Endpoint::Deck => &self.deck_root,
        }
    }

    /// Remove staging files an interrupted run left behind.
    pub fn sweep_staging(&self, stale: &[PathBuf]) {
        for path in stale {
            match io::remove_file(path) {
                Ok(_) => tracing::debug!(?path, "Removed stale staging file"),
                Err(e) => tracing::warn!(?path, error = %e, "Could not remove stale staging file"),
            }
        }
    }

    /// Execute every filesystem action of `plan`, deletions first.
    ///
    /// `pc` and `deck` are the manifests the plan was derived from; a file
    /// that changed since then is not touched.
    pub fn execute(&self, plan: &SyncPlan, pc: &Manifest, deck: &Manifest) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();

        for (path, action) in plan.execution_order() {
            if self.cancel.is_cancelled() {
                tracing::info!("Transfer cancelled");
                outcome.cancelled = true;
                break;
            }

            match self.apply(path, action, pc, deck) {
                Ok(()) => {
                    tracing::debug!(path = %path, %action, "Applied");
                    outcome.completed.push((path.clone(), action));
                }
                Err(e) => {
                    tracing::warn!(path = %path, %action, error = %e, "Transfer failed");
                    outcome.errors.push(PathError {
                        path: path.clone(),
                        action,
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome
    }

    fn apply(
        &self,
        path: &RelativePath,
        action: SyncAction,
        pc: &Manifest,
        deck: &Manifest,
    ) -> Result<()> {
        let Some(target) = action.target() else {
            return Ok(());
        };
        let (target_manifest, source_manifest) = match target {
            Endpoint::Pc => (pc, deck),
            Endpoint::Deck => (deck, pc),
        };
        let dst = path.under(self.root(target));

        if action.is_delete() {
            ensure_unchanged(&dst, target_manifest.get(path))?;
            io::remove_file(&dst).map_err(|e| transfer(&dst, e))?;
            return Ok(());
        }

        let src = path.under(self.root(target.other()));
        let source = source_manifest
            .get(path)
            .ok_or_else(|| transfer(&src, "source is missing from its snapshot"))?;
        ensure_unchanged(&src, Some(source))?;
        ensure_unchanged(&dst, target_manifest.get(path))?;

        io::stage_copy(
            &src,
            &dst,
            StageOptions {
                expected_size: Some(source.size),
                modified: source.modified_system_time(),
                fsync: self.fsync,
            },
        )
        .map_err(|e| transfer(&dst, e))?;
        Ok(())
    }
}

fn transfer(path: &Path, message: impl ToString) -> Error {
    Error::Transfer {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Fail when `path` no longer matches the snapshot it was planned from.
fn ensure_unchanged(path: &Path, expected: Option<&FileManifestEntry>) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(transfer(path, e)),
    };

    let Some(expected) = expected else {
        return Err(transfer(path, "file appeared after the snapshot was taken"));
    };
    let modified = meta.modified().ok().map(DateTime::<Utc>::from);
    if !meta.file_type().is_file() || meta.len() != expected.size || modified != expected.modified {
        return Err(transfer(path, "file changed after the snapshot was taken"));
    }
    Ok(())
}
