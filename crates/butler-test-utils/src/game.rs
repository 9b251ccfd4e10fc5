//! [`TestGame`] fixture for sync scenarios.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::{Value, json};
use tempfile::TempDir;

/// A fixed point in time offset by `secs`, so tests control mtime ordering.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
}

/// A temporary game with `pc/`, `deck/` and `state/` directories.
///
/// # Example
///
/// ```rust,no_run
/// use butler_test_utils::{TestGame, at};
///
/// let game = TestGame::new();
/// game.write_pc("save.dat", "progress", at(10));
/// game.assert_deck_missing("save.dat");
/// ```
pub struct TestGame {
    temp_dir: TempDir,
}

impl Default for TestGame {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGame {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["pc", "deck", "state"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn pc(&self) -> PathBuf {
        self.root().join("pc")
    }

    pub fn deck(&self) -> PathBuf {
        self.root().join("deck")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join("state")
    }

    /// Write `rel` below the PC root and stamp its mtime.
    pub fn write_pc(&self, rel: &str, content: &str, modified: SystemTime) {
        write_stamped(&self.pc().join(rel), content, modified);
    }

    /// Write `rel` below the Deck root and stamp its mtime.
    pub fn write_deck(&self, rel: &str, content: &str, modified: SystemTime) {
        write_stamped(&self.deck().join(rel), content, modified);
    }

    pub fn read_pc(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.pc().join(rel)).ok()
    }

    pub fn read_deck(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.deck().join(rel)).ok()
    }

    pub fn remove_pc(&self, rel: &str) {
        fs::remove_file(self.pc().join(rel)).unwrap();
    }

    pub fn remove_deck(&self, rel: &str) {
        fs::remove_file(self.deck().join(rel)).unwrap();
    }

    /// Assert both endpoints hold `rel` with `content`.
    ///
    /// # Panics
    /// Panics with both sides' contents when either differs.
    pub fn assert_both(&self, rel: &str, content: &str) {
        let (pc, deck) = (self.read_pc(rel), self.read_deck(rel));
        assert!(
            pc.as_deref() == Some(content) && deck.as_deref() == Some(content),
            "Expected {rel:?} = {content:?} on both sides\nPC:   {pc:?}\nDeck: {deck:?}"
        );
    }

    pub fn assert_pc_missing(&self, rel: &str) {
        let path = self.pc().join(rel);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    pub fn assert_deck_missing(&self, rel: &str) {
        let path = self.deck().join(rel);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    /// Game entry in configuration form, pointing at this fixture.
    pub fn game_json(&self, id: u64, name: &str, files: Option<&[&str]>) -> Value {
        json!({
            "_id": id,
            "name": name,
            "pcPath": self.pc(),
            "deckPath": self.deck(),
            "files": files,
        })
    }

    /// Write a JSON configuration file for `games` below the fixture root.
    ///
    /// `extra` is merged into the top level (e.g. `{"autoSync": true}`).
    pub fn write_config(&self, games: &[Value], extra: Value) -> PathBuf {
        let mut config = json!({
            "stateDir": self.state_dir(),
            "games": games,
        });
        if let (Some(target), Value::Object(extra)) = (config.as_object_mut(), extra) {
            target.extend(extra);
        }
        let path = self.root().join("deck-save-butler.json");
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        path
    }
}

fn write_stamped(path: &Path, content: &str, modified: SystemTime) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}
