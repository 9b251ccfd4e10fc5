//! Multi-session scenarios: play on one machine, sync, play on the other.
//!
//! Every test drives the engine from a configuration file, the same way the
//! CLI does, and checks both endpoints and the LastSynced record afterwards.

use std::fs;

use butler_core::{
    ButlerConfig, CancellationFlag, DivergenceClass, Manifest, RunReport, RunStatus, Snapshotter,
    SyncAction, SyncOptions, SyncOrchestrator, SyncStatus,
};
use butler_test_utils::{TestGame, at};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn sync_from(config: &ButlerConfig) -> RunReport {
    SyncOrchestrator::from_config(config)
        .fsync(false)
        .run_all(&config.games, SyncOptions::default(), &CancellationFlag::new())
        .await
}

fn load(game: &TestGame, files: Option<&[&str]>) -> ButlerConfig {
    let path = game.write_config(&[game.game_json(1, "Celeste", files)], json!({}));
    ButlerConfig::load(&path).unwrap()
}

fn scan(config: &ButlerConfig, root: &std::path::Path) -> Manifest {
    Snapshotter::new(config.games[0].file_filter.clone())
        .scan(root, None)
        .unwrap()
        .manifest
}

#[tokio::test]
async fn saves_follow_the_player_between_machines() {
    let game = TestGame::new();
    let config = load(&game, None);

    // Evening on the PC
    game.write_pc("profile/slot1.sav", "chapter 1", at(100));
    game.write_pc("settings.ini", "vsync=on", at(100));
    let run = sync_from(&config).await;
    assert_eq!(run.status, RunStatus::Success);
    game.assert_both("profile/slot1.sav", "chapter 1");

    // Train ride on the Deck
    game.write_deck("profile/slot1.sav", "chapter 2", at(200));
    game.write_deck("profile/slot2.sav", "new run", at(210));
    let run = sync_from(&config).await;
    assert_eq!(run.reports[0].counts.copied_to_pc, 2);
    game.assert_both("profile/slot1.sav", "chapter 2");
    game.assert_both("profile/slot2.sav", "new run");

    // Back on the PC: delete a slot
    game.remove_pc("profile/slot2.sav");
    let run = sync_from(&config).await;
    assert_eq!(run.reports[0].counts.deleted_on_deck, 1);
    game.assert_deck_missing("profile/slot2.sav");

    // Nothing left to do
    let run = sync_from(&config).await;
    assert_eq!(run.reports[0].counts.total(), 0);
    assert!(run.reports[0].plan.is_empty());

    let pc = scan(&config, &game.pc());
    let deck = scan(&config, &game.deck());
    assert!(pc.same_state(&deck));
}

#[tokio::test]
async fn baseline_records_converged_state() {
    let game = TestGame::new();
    let config = load(&game, None);
    game.write_pc("a.sav", "aaa", at(10));
    game.write_deck("b.sav", "b", at(20));

    sync_from(&config).await;

    let store = SyncOrchestrator::from_config(&config).store().clone();
    let record = store.load(1).unwrap().unwrap();
    assert!(record.manifest.same_state(&scan(&config, &game.pc())));
    assert!(record.manifest.same_state(&scan(&config, &game.deck())));
}

#[tokio::test]
async fn unresolved_conflict_keeps_previous_baseline() {
    let game = TestGame::new();
    let config = load(&game, None);
    game.write_pc("save.dat", "base", at(10));
    sync_from(&config).await;
    let store = SyncOrchestrator::from_config(&config).store().clone();
    let before = store.load(1).unwrap().unwrap();

    // Both machines played offline and wrote at the same second
    game.write_pc("save.dat", "pc-run", at(50));
    game.write_deck("save.dat", "dk-run", at(50));
    let run = sync_from(&config).await;

    let report = &run.reports[0];
    assert_eq!(report.status, SyncStatus::Success);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.plan[0].class, DivergenceClass::ConflictBothModified);
    assert_eq!(report.plan[0].action, SyncAction::SkipConflict);
    assert_eq!(game.read_pc("save.dat").as_deref(), Some("pc-run"));
    assert_eq!(game.read_deck("save.dat").as_deref(), Some("dk-run"));

    let after = store.load(1).unwrap().unwrap();
    assert_eq!(after.manifest, before.manifest);
}

#[tokio::test]
async fn explicit_file_list_limits_the_sync() {
    let game = TestGame::new();
    let config = load(&game, Some(&["slot1.sav", "slot2.sav"]));
    game.write_pc("slot1.sav", "one", at(10));
    game.write_pc("slot3.sav", "three", at(10));
    game.write_deck("slot2.sav", "two", at(10));

    let run = sync_from(&config).await;

    assert_eq!(run.reports[0].counts.copies(), 2);
    game.assert_both("slot1.sav", "one");
    game.assert_both("slot2.sav", "two");
    game.assert_deck_missing("slot3.sav");
}

#[tokio::test]
async fn interrupted_copy_leaves_no_visible_file() {
    let game = TestGame::new();
    let config = load(&game, None);
    game.write_pc("save.dat", "complete", at(10));
    // What a crash mid-copy leaves behind
    let staging = butler_fs::io::staging_path_for(&game.deck().join("save.dat"));
    fs::write(&staging, "compl").unwrap();

    let run = sync_from(&config).await;

    assert_eq!(run.reports[0].status, SyncStatus::Success);
    game.assert_both("save.dat", "complete");
    assert!(!staging.exists());
    let deck_entries: Vec<_> = fs::read_dir(game.deck()).unwrap().collect();
    assert_eq!(deck_entries.len(), 1);
}

#[tokio::test]
async fn dry_run_then_real_run_agree() {
    let game = TestGame::new();
    let config = load(&game, None);
    game.write_pc("a.sav", "a", at(10));
    game.write_deck("b.sav", "b", at(10));

    let orchestrator = SyncOrchestrator::from_config(&config).fsync(false);
    let cancel = CancellationFlag::new();
    let preview = orchestrator
        .run_all(&config.games, SyncOptions { dry_run: true }, &cancel)
        .await;
    let real = orchestrator
        .run_all(&config.games, SyncOptions::default(), &cancel)
        .await;

    assert_eq!(preview.reports[0].plan, real.reports[0].plan);
    assert_eq!(real.reports[0].counts.total(), preview.reports[0].plan.len());
}
