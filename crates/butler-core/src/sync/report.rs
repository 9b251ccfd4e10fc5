//! Per-game and per-run results

use butler_fs::RelativePath;
use serde::{Deserialize, Serialize};

use super::divergence::DivergenceClass;
use super::plan::{SyncAction, SyncPlan};
use crate::config::GameSyncSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    PartialFailure,
    Failed,
}

/// Number of actions actually carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub copied_to_deck: usize,
    pub copied_to_pc: usize,
    pub deleted_on_deck: usize,
    pub deleted_on_pc: usize,
}

impl ActionCounts {
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::CopyToDeck => self.copied_to_deck += 1,
            SyncAction::CopyToPc => self.copied_to_pc += 1,
            SyncAction::DeleteOnDeck => self.deleted_on_deck += 1,
            SyncAction::DeleteOnPc => self.deleted_on_pc += 1,
            SyncAction::Skip | SyncAction::SkipConflict => {}
        }
    }

    pub fn copies(&self) -> usize {
        self.copied_to_deck + self.copied_to_pc
    }

    pub fn deletions(&self) -> usize {
        self.deleted_on_deck + self.deleted_on_pc
    }

    pub fn total(&self) -> usize {
        self.copies() + self.deletions()
    }
}

/// A path-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathError {
    pub path: RelativePath,
    pub action: SyncAction,
    pub message: String,
}

/// One line of the plan: a path that needed attention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub path: RelativePath,
    pub class: DivergenceClass,
    pub action: SyncAction,
}

/// Outcome of one game's sync pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub game_id: u64,
    pub game_name: String,
    pub status: SyncStatus,
    pub dry_run: bool,
    pub counts: ActionCounts,
    /// Non-skip entries of the plan
    pub plan: Vec<PlanEntry>,
    /// Paths left unresolved for the user
    pub conflicts: Vec<RelativePath>,
    pub errors: Vec<PathError>,
    /// Game-level failure (unavailable endpoint, scan failure, baseline store)
    pub game_error: Option<String>,
    pub cancelled: bool,
    /// Whether a new LastSynced baseline was written
    pub baseline_saved: bool,
}

impl SyncReport {
    /// Report for a game that failed before any filesystem mutation.
    pub fn failed(spec: &GameSyncSpec, error: impl ToString) -> Self {
        ReportBuilder::new(spec, false).game_error(error).finish()
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Accumulates a report during a pass; [`finish`](Self::finish) freezes it.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    report: SyncReport,
    /// One endpoint could not be scanned while the other could
    partial_scan: bool,
    executed: bool,
}

impl ReportBuilder {
    pub(crate) fn new(spec: &GameSyncSpec, dry_run: bool) -> Self {
        Self {
            report: SyncReport {
                game_id: spec.id,
                game_name: spec.name.clone(),
                status: SyncStatus::Success,
                dry_run,
                counts: ActionCounts::default(),
                plan: Vec::new(),
                conflicts: Vec::new(),
                errors: Vec::new(),
                game_error: None,
                cancelled: false,
                baseline_saved: false,
            },
            partial_scan: false,
            executed: false,
        }
    }

    pub(crate) fn plan(mut self, plan: &SyncPlan) -> Self {
        self.report.plan = plan
            .iter()
            .filter(|(_, p)| p.action != SyncAction::Skip)
            .map(|(path, p)| PlanEntry {
                path: path.clone(),
                class: p.class,
                action: p.action,
            })
            .collect();
        self.report.conflicts = plan.conflicts();
        self
    }

    pub(crate) fn game_error(mut self, error: impl ToString) -> Self {
        self.report.game_error = Some(error.to_string());
        self
    }

    pub(crate) fn partial_scan(mut self, partial: bool) -> Self {
        self.partial_scan = partial;
        self
    }

    pub(crate) fn executed(
        mut self,
        completed: &[(RelativePath, SyncAction)],
        errors: Vec<PathError>,
    ) -> Self {
        self.executed = true;
        for (_, action) in completed {
            self.report.counts.record(*action);
        }
        self.report.errors.extend(errors);
        self
    }

    pub(crate) fn cancelled(mut self, cancelled: bool) -> Self {
        self.report.cancelled = cancelled;
        self
    }

    pub(crate) fn baseline_saved(mut self, saved: bool) -> Self {
        self.report.baseline_saved = saved;
        self
    }

    pub(crate) fn finish(mut self) -> SyncReport {
        let r = &self.report;
        let status = if r.game_error.is_some() && !self.executed && !self.partial_scan {
            SyncStatus::Failed
        } else if r.cancelled && r.counts.total() == 0 && r.errors.is_empty() {
            SyncStatus::Failed
        } else if r.game_error.is_some() || !r.errors.is_empty() || r.cancelled {
            SyncStatus::PartialFailure
        } else {
            SyncStatus::Success
        };
        self.report.status = status;
        self.report
    }
}

/// Overall outcome of a multi-game run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// One report per game, in configuration order
    pub reports: Vec<SyncReport>,
}

impl RunReport {
    pub fn new(reports: Vec<SyncReport>) -> Self {
        let succeeded = reports.iter().filter(|r| r.is_success()).count();
        let failed = reports
            .iter()
            .filter(|r| r.status == SyncStatus::Failed)
            .count();
        let status = if succeeded == reports.len() {
            RunStatus::Success
        } else if failed == reports.len() {
            RunStatus::Failed
        } else {
            RunStatus::PartialFailure
        };
        Self { status, reports }
    }

    pub fn report(&self, game_id: u64) -> Option<&SyncReport> {
        self.reports.iter().find(|r| r.game_id == game_id)
    }

    pub fn total_conflicts(&self) -> usize {
        self.reports.iter().map(|r| r.conflicts.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GameSyncSpec {
        GameSyncSpec::new(1, "Celeste", "/pc", "/deck")
    }

    #[test]
    fn game_error_before_execution_is_failed() {
        let report = SyncReport::failed(&spec(), "unmounted");
        assert_eq!(report.status, SyncStatus::Failed);
        assert_eq!(report.game_error.as_deref(), Some("unmounted"));
        assert_eq!(report.counts.total(), 0);
    }

    #[test]
    fn one_sided_scan_failure_is_partial() {
        let report = ReportBuilder::new(&spec(), false)
            .game_error("scan failed")
            .partial_scan(true)
            .finish();
        assert_eq!(report.status, SyncStatus::PartialFailure);
    }

    #[test]
    fn path_errors_make_partial_failure() {
        let path = RelativePath::new("save.dat").unwrap();
        let report = ReportBuilder::new(&spec(), false)
            .executed(
                &[(path.clone(), SyncAction::CopyToDeck)],
                vec![PathError {
                    path,
                    action: SyncAction::CopyToPc,
                    message: "disk full".into(),
                }],
            )
            .finish();
        assert_eq!(report.status, SyncStatus::PartialFailure);
        assert_eq!(report.counts.copied_to_deck, 1);
    }

    #[test]
    fn conflicts_alone_are_not_failures() {
        let path = RelativePath::new("save.dat").unwrap();
        let plan: SyncPlan = [(
            path.clone(),
            crate::sync::PlannedAction {
                class: DivergenceClass::ConflictBothModified,
                action: SyncAction::SkipConflict,
            },
        )]
        .into_iter()
        .collect();
        let report = ReportBuilder::new(&spec(), false)
            .plan(&plan)
            .executed(&[], Vec::new())
            .finish();
        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.conflicts, vec![path]);
    }

    #[test]
    fn cancelled_before_any_work_is_failed() {
        let report = ReportBuilder::new(&spec(), false).cancelled(true).finish();
        assert_eq!(report.status, SyncStatus::Failed);
    }

    #[test]
    fn run_status_summarizes_games() {
        let ok = ReportBuilder::new(&spec(), false).finish();
        let bad = SyncReport::failed(&spec(), "x");

        assert_eq!(RunReport::new(vec![]).status, RunStatus::Success);
        assert_eq!(RunReport::new(vec![ok.clone()]).status, RunStatus::Success);
        assert_eq!(RunReport::new(vec![bad.clone()]).status, RunStatus::Failed);
        assert_eq!(RunReport::new(vec![ok, bad]).status, RunStatus::PartialFailure);
    }
}
