//! Configuration files in every supported format driving a real sync

use std::fs;

use butler_core::{
    ButlerConfig, CancellationFlag, ConflictPolicy, FileFilter, SyncOptions, SyncOrchestrator,
};
use butler_test_utils::{TestGame, at};
use serde_json::json;

#[test]
fn original_schema_with_snake_case_auto_sync_loads() {
    let game = TestGame::new();
    let path = game.root().join("legacy.json");
    fs::write(
        &path,
        r#"{
            "auto_sync": true,
            "games": [
                { "_id": 0, "name": "Stardew Valley", "pcPath": "pc", "deckPath": "deck", "files": null }
            ]
        }"#,
    )
    .unwrap();

    let config = ButlerConfig::load(&path).unwrap();

    assert!(config.auto_sync);
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.conflict_policy, ConflictPolicy::NewerWins);
    assert_eq!(config.games[0].file_filter, FileFilter::AllFiles);
}

#[test]
fn toml_config_loads() {
    let game = TestGame::new();
    let path = game.root().join("butler.toml");
    fs::write(
        &path,
        r#"
autoSync = false
concurrency = 4
conflictPolicy = "prefer-deck"

[[games]]
_id = 3
name = "Hades"
pcPath = "pc"
deckPath = "deck"
files = ["ProfileA.sav"]
"#,
    )
    .unwrap();

    let config = ButlerConfig::load(&path).unwrap();

    assert_eq!(config.concurrency, 4);
    assert_eq!(config.conflict_policy, ConflictPolicy::PreferDeck);
    assert!(!config.games[0].file_filter.is_all());
}

#[test]
fn duplicate_ids_are_rejected() {
    let game = TestGame::new();
    let path = game.write_config(
        &[
            game.game_json(1, "A", None),
            json!({"_id": 1, "name": "B", "pcPath": "/b/pc", "deckPath": "/b/deck"}),
        ],
        json!({}),
    );

    assert!(ButlerConfig::load(&path).is_err());
}

#[tokio::test]
async fn relative_endpoints_resolve_next_to_yaml_config() {
    let game = TestGame::new();
    game.write_pc("save.dat", "progress", at(10));
    let path = game.root().join("butler.yaml");
    fs::write(
        &path,
        "stateDir: state\ngames:\n  - _id: 1\n    name: Celeste\n    pcPath: pc\n    deckPath: deck\n",
    )
    .unwrap();

    let config = ButlerConfig::load(&path).unwrap();
    let run = SyncOrchestrator::from_config(&config)
        .fsync(false)
        .run_all(&config.games, SyncOptions::default(), &CancellationFlag::new())
        .await;

    assert!(run.reports[0].is_success(), "{:?}", run.reports[0]);
    game.assert_both("save.dat", "progress");
    assert!(game.state_dir().join("game-1.json").exists());
}
