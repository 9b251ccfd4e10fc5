use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::SystemTime;

use butler_fs::RelativePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Modification times closer than this are considered equal when comparing
/// endpoints. FAT-formatted cards only store even seconds.
pub const MTIME_TOLERANCE_SECS: i64 = 2;

/// Metadata of one file at one endpoint at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestEntry {
    pub size: u64,
    /// `None` when the platform could not report a modification time
    pub modified: Option<DateTime<Utc>>,
    /// `sha256:<hex>` of the content
    pub fingerprint: String,
}

impl FileManifestEntry {
    pub fn new(size: u64, modified: Option<SystemTime>, fingerprint: impl Into<String>) -> Self {
        Self {
            size,
            modified: modified.map(DateTime::<Utc>::from),
            fingerprint: fingerprint.into(),
        }
    }

    /// Whether two entries describe the same file state: same size and
    /// fingerprint, and modification times equal within the filesystem
    /// granularity tolerance.
    pub fn same_state(&self, other: &Self) -> bool {
        self.size == other.size
            && self.fingerprint == other.fingerprint
            && match (self.modified, other.modified) {
                (Some(a), Some(b)) => (a - b).num_seconds().abs() < MTIME_TOLERANCE_SECS,
                (None, None) => true,
                _ => false,
            }
    }

    pub fn modified_system_time(&self) -> Option<SystemTime> {
        self.modified.map(SystemTime::from)
    }
}

/// Compare two optional entries, treating "absent on both" as equal.
pub(crate) fn same_state(a: Option<&FileManifestEntry>, b: Option<&FileManifestEntry>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_state(b),
        (None, None) => true,
        _ => false,
    }
}

/// Relative path -> entry map for one endpoint, one game, one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<RelativePath, FileManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: RelativePath, entry: FileManifestEntry) {
        self.entries.insert(path, entry);
    }

    pub fn get(&self, path: &RelativePath) -> Option<&FileManifestEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, RelativePath, FileManifestEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.entries.keys()
    }

    /// Total bytes tracked by this manifest.
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }

    /// Whether both manifests hold the same paths in the same state.
    pub fn same_state(&self, other: &Manifest) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(path, entry)| other.get(path).is_some_and(|o| entry.same_state(o)))
    }

    /// Entries on which `self` and `other` agree.
    ///
    /// This is what both endpoints demonstrably share, i.e. a valid baseline.
    pub fn agreed_with(&self, other: &Manifest) -> Manifest {
        let entries = self
            .iter()
            .filter(|(path, entry)| other.get(path).is_some_and(|o| entry.same_state(o)))
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect();
        Manifest { entries }
    }
}

impl FromIterator<(RelativePath, FileManifestEntry)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (RelativePath, FileManifestEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a RelativePath, &'a FileManifestEntry);
    type IntoIter = btree_map::Iter<'a, RelativePath, FileManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64, nanos: u32) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::new(secs, nanos))
    }

    #[test]
    fn same_state_tolerates_coarse_timestamps() {
        let a = FileManifestEntry::new(10, at(1_000, 0), "sha256:aa");
        let b = FileManifestEntry::new(10, at(1_001, 500_000_000), "sha256:aa");
        assert!(a.same_state(&b));
    }

    #[test]
    fn same_state_requires_matching_fingerprint() {
        let a = FileManifestEntry::new(10, at(1_000, 0), "sha256:aa");
        let b = FileManifestEntry::new(10, at(1_000, 0), "sha256:bb");
        assert!(!a.same_state(&b));
    }

    #[test]
    fn same_state_distinguishes_distant_timestamps() {
        let a = FileManifestEntry::new(10, at(1_000, 0), "sha256:aa");
        let b = FileManifestEntry::new(10, at(1_005, 0), "sha256:aa");
        assert!(!a.same_state(&b));
        assert!(!a.same_state(&FileManifestEntry::new(10, None, "sha256:aa")));
    }

    #[test]
    fn agreed_with_keeps_only_shared_state() {
        let p = |s: &str| RelativePath::new(s).unwrap();
        let shared = FileManifestEntry::new(1, at(5, 0), "sha256:1");
        let pc: Manifest = [
            (p("a.sav"), shared.clone()),
            (p("b.sav"), FileManifestEntry::new(2, at(5, 0), "sha256:2")),
            (p("c.sav"), shared.clone()),
        ]
        .into_iter()
        .collect();
        let deck: Manifest = [
            (p("a.sav"), shared.clone()),
            (p("b.sav"), FileManifestEntry::new(3, at(9, 0), "sha256:3")),
        ]
        .into_iter()
        .collect();

        let agreed = pc.agreed_with(&deck);

        assert_eq!(agreed.paths().map(|p| p.as_str()).collect::<Vec<_>>(), vec!["a.sav"]);
        assert!(!pc.same_state(&deck));
        assert!(agreed.same_state(&deck.agreed_with(&pc)));
    }

    #[test]
    fn manifest_serializes_as_path_map() {
        let mut manifest = Manifest::new();
        manifest.insert(
            RelativePath::new("slot1.sav").unwrap(),
            FileManifestEntry::new(4, at(1_700_000_000, 0), "sha256:ff"),
        );
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["slot1.sav"]["size"], 4);
        let back: Manifest = serde_json::from_value(value).unwrap();
        assert_eq!(back, manifest);
    }
}
