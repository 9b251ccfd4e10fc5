//! Human-readable report output

use butler_core::{RunReport, SyncAction, SyncReport, SyncStatus};
use colored::Colorize;

pub fn run_report(run: &RunReport) {
    for report in &run.reports {
        game_report(report);
    }

    if run.reports.is_empty() {
        println!("{} No games configured.", "OK".green().bold());
        return;
    }

    let count = |status: SyncStatus| run.reports.iter().filter(|r| r.status == status).count();
    println!();
    println!(
        "{} succeeded, {} partial, {} failed",
        count(SyncStatus::Success).to_string().green(),
        count(SyncStatus::PartialFailure).to_string().yellow(),
        count(SyncStatus::Failed).to_string().red(),
    );
    let conflicts = run.total_conflicts();
    if conflicts > 0 {
        println!(
            "{} path(s) need a decision; resolve them by hand and run {} again.",
            conflicts.to_string().yellow(),
            "butler sync".cyan()
        );
    }
}

fn game_report(report: &SyncReport) {
    let label = match report.status {
        SyncStatus::Success if report.dry_run => "PLAN".blue().bold(),
        SyncStatus::Success => "OK".green().bold(),
        SyncStatus::PartialFailure => "PARTIAL".yellow().bold(),
        SyncStatus::Failed => "FAILED".red().bold(),
    };
    let title = format!("{} (#{})", report.game_name, report.game_id);

    if report.dry_run {
        let changes = report.plan.len() - report.conflicts.len();
        println!("{} {}: {} change(s)", label, title.cyan(), changes);
    } else {
        let counts = &report.counts;
        println!(
            "{} {}: {} to Deck, {} to PC, {} deleted",
            label,
            title.cyan(),
            counts.copied_to_deck,
            counts.copied_to_pc,
            counts.deletions()
        );
    }

    if let Some(error) = &report.game_error {
        println!("   {} {}", "!".red(), error);
    }
    if report.dry_run {
        for entry in report.plan.iter().filter(|e| e.action != SyncAction::SkipConflict) {
            println!("   {} {} ({})", "~".blue(), entry.path, entry.action.to_string().dimmed());
        }
    }
    for path in &report.conflicts {
        println!("   {} {} (conflict, left untouched)", "?".yellow(), path);
    }
    for error in &report.errors {
        println!("   {} {}: {}", "!".red(), error.path, error.message);
    }
    if report.cancelled {
        println!("   {} cancelled", "!".yellow());
    }
}
