//! Sync and status command implementations

use std::path::Path;

use butler_core::{CancellationFlag, RunStatus, SyncOptions, SyncOrchestrator};
use colored::Colorize;

use super::{load_config, render, select_games};
use crate::cli::GameSelection;
use crate::error::{CliError, Result};

/// Flags shared by `sync`, `status` and the implicit auto-sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncRequest {
    pub dry_run: bool,
    pub json: bool,
    pub concurrency: Option<usize>,
}

/// Run the orchestrator over the selected games.
///
/// Returns whether every game finished with `Success`. Ctrl-C cancels the
/// run cooperatively: files already in flight complete, nothing else starts.
pub fn run_sync(config_path: &Path, selection: &GameSelection, request: SyncRequest) -> Result<bool> {
    let config = load_config(config_path)?;
    let games = select_games(&config, selection)?;

    let mut orchestrator = SyncOrchestrator::from_config(&config);
    if let Some(limit) = request.concurrency {
        if limit == 0 {
            return Err(CliError::user("--concurrency must be at least 1"));
        }
        orchestrator = orchestrator.concurrency(limit);
    }

    if !request.json {
        let verb = if request.dry_run { "Planning" } else { "Syncing" };
        println!("{} {} {} game(s)...", "=>".blue().bold(), verb, games.len());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let cancel = CancellationFlag::new();
    let options = SyncOptions {
        dry_run: request.dry_run,
    };

    let run = runtime.block_on(async {
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, stopping after the current files");
                    cancel.cancel();
                }
            }
        });
        let run = orchestrator.run_all(&games, options, &cancel).await;
        interrupt.abort();
        run
    });

    if request.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        render::run_report(&run);
    }
    Ok(run.status == RunStatus::Success)
}
