//! LastSynced store behaviour across games and passes

use std::sync::{Arc, Barrier};
use std::thread;

use butler_core::{
    BaselineRecord, CancellationFlag, GameSyncSpec, LastSyncedStore, Manifest, SyncOptions,
    SyncOrchestrator,
};
use butler_test_utils::{TestGame, at};
use tempfile::tempdir;

#[test]
fn games_write_their_records_concurrently() {
    let dir = tempdir().unwrap();
    let store = LastSyncedStore::new(dir.path());
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6u64)
        .map(|id| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .save(&BaselineRecord::new(id, format!("Game {id}"), Manifest::new()))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    for id in 0..6 {
        let record = store.load(id).unwrap().unwrap();
        assert_eq!(record.game_name, format!("Game {id}"));
    }
}

#[tokio::test]
async fn baseline_matches_both_endpoints_after_sync() {
    let game = TestGame::new();
    game.write_pc("a.sav", "a", at(10));
    game.write_deck("b.sav", "bb", at(20));
    let store = LastSyncedStore::new(game.state_dir());
    let spec = GameSyncSpec::new(
        9,
        "Hollow Knight",
        game.pc().to_string_lossy(),
        game.deck().to_string_lossy(),
    );

    SyncOrchestrator::new(store.clone())
        .fsync(false)
        .sync_game(&spec, SyncOptions::default(), &CancellationFlag::new())
        .await;

    let record = store.load(9).unwrap().unwrap();
    let paths: Vec<&str> = record.manifest.paths().map(|p| p.as_str()).collect();
    assert_eq!(paths, vec!["a.sav", "b.sav"]);
    assert_eq!(record.game_name, "Hollow Knight");
    assert_eq!(record.manifest.total_size(), 3);
}

#[tokio::test]
async fn reset_baseline_turns_next_pass_into_first_sync() {
    let game = TestGame::new();
    game.write_pc("save.dat", "v1", at(10));
    let store = LastSyncedStore::new(game.state_dir());
    let orchestrator = SyncOrchestrator::new(store.clone()).fsync(false);
    let spec = GameSyncSpec::new(
        1,
        "Celeste",
        game.pc().to_string_lossy(),
        game.deck().to_string_lossy(),
    );
    orchestrator
        .sync_game(&spec, SyncOptions::default(), &CancellationFlag::new())
        .await;

    assert!(store.remove(1).unwrap());
    // Without a baseline a deletion looks like a new file on the other side
    game.remove_pc("save.dat");
    let report = orchestrator
        .sync_game(&spec, SyncOptions::default(), &CancellationFlag::new())
        .await;

    assert_eq!(report.counts.copied_to_pc, 1);
    game.assert_both("save.dat", "v1");
}
