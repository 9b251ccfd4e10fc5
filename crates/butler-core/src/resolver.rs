//! Endpoint resolution for one game
//!
//! Turns the raw configured paths into two validated endpoint directories and
//! the effective file filter.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{FileFilter, GameSyncSpec};
use crate::{Error, Result};

/// One side of a synchronization pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Pc,
    Deck,
}

impl Endpoint {
    pub fn other(self) -> Self {
        match self {
            Self::Pc => Self::Deck,
            Self::Deck => Self::Pc,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc => f.write_str("PC"),
            Self::Deck => f.write_str("Deck"),
        }
    }
}

/// A game whose endpoints were checked and normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGame {
    pub id: u64,
    pub name: String,
    pub pc_root: PathBuf,
    pub deck_root: PathBuf,
    pub filter: FileFilter,
    /// Endpoint directories that did not exist yet (created unless dry-run)
    pub created: Vec<Endpoint>,
}

impl ResolvedGame {
    pub fn root(&self, endpoint: Endpoint) -> &Path {
        match endpoint {
            Endpoint::Pc => &self.pc_root,
            Endpoint::Deck => &self.deck_root,
        }
    }
}

enum Probe {
    Directory,
    Missing,
}

/// Validates endpoint directories before anything is scanned
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    base_dir: Option<PathBuf>,
    dry_run: bool,
}

impl PathResolver {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            dry_run: false,
        }
    }

    /// In dry-run mode a missing endpoint is reported but never created.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve both endpoints of `spec`.
    ///
    /// A missing endpoint is accepted when the other one exists and is
    /// created as an empty directory. Fails with `PathUnavailable` when an
    /// endpoint is not a readable directory or neither exists. Identical or
    /// nested endpoints are rejected before anything is created.
    pub fn resolve(&self, spec: &GameSyncSpec) -> Result<ResolvedGame> {
        let pc = self.expand(&spec.pc_path)?;
        let deck = self.expand(&spec.deck_path)?;

        let missing = match (probe(&pc)?, probe(&deck)?) {
            (Probe::Directory, Probe::Directory) => None,
            (Probe::Missing, Probe::Missing) => {
                return Err(Error::unavailable(
                    &pc,
                    format!("neither endpoint exists (Deck: {})", deck.display()),
                ));
            }
            (Probe::Missing, Probe::Directory) => Some(Endpoint::Pc),
            (Probe::Directory, Probe::Missing) => Some(Endpoint::Deck),
        };

        let pc_root = anchored(&pc)?;
        let deck_root = anchored(&deck)?;

        if pc_root == deck_root {
            return Err(Error::SameEndpoint { path: pc_root });
        }
        if pc_root.starts_with(&deck_root) || deck_root.starts_with(&pc_root) {
            return Err(Error::OverlappingEndpoints {
                pc: pc_root,
                deck: deck_root,
            });
        }

        let mut created = Vec::new();
        if let Some(endpoint) = missing {
            let root = match endpoint {
                Endpoint::Pc => &pc_root,
                Endpoint::Deck => &deck_root,
            };
            self.create(root)?;
            created.push(endpoint);
        }

        Ok(ResolvedGame {
            id: spec.id,
            name: spec.name.clone(),
            pc_root,
            deck_root,
            filter: spec.file_filter.clone(),
            created,
        })
    }

    fn expand(&self, raw: &str) -> Result<PathBuf> {
        let raw = raw.trim();
        let path = if raw == "~" || raw.starts_with("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| Error::unavailable(raw, "home directory is unknown"))?;
            home.join(raw.trim_start_matches('~').trim_start_matches('/'))
        } else {
            PathBuf::from(raw)
        };

        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }

    fn create(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            tracing::info!(?path, "[dry-run] Would create endpoint directory");
            return Ok(());
        }
        tracing::info!(?path, "Creating missing endpoint directory");
        fs::create_dir_all(path).map_err(|e| Error::unavailable(path, e.to_string()))
    }
}

fn probe(path: &Path) -> Result<Probe> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            fs::read_dir(path).map_err(|e| Error::unavailable(path, e.to_string()))?;
            Ok(Probe::Directory)
        }
        Ok(_) => Err(Error::unavailable(path, "not a directory")),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Probe::Missing),
        Err(e) => Err(Error::unavailable(path, e.to_string())),
    }
}

/// Canonical form of `path` even when it does not exist yet: the deepest
/// existing ancestor is canonicalized and the missing tail appended.
fn anchored(path: &Path) -> Result<PathBuf> {
    for base in path.ancestors() {
        let existing = if base.as_os_str().is_empty() { Path::new(".") } else { base };
        match dunce::canonicalize(existing) {
            Ok(mut out) => {
                let tail = path.strip_prefix(base).unwrap_or(Path::new(""));
                for component in tail.components() {
                    match component {
                        Component::ParentDir => {
                            out.pop();
                        }
                        Component::Normal(part) => out.push(part),
                        _ => {}
                    }
                }
                return Ok(out);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::unavailable(path, e.to_string())),
        }
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spec(pc: &Path, deck: &Path) -> GameSyncSpec {
        GameSyncSpec::new(1, "Celeste", pc.to_string_lossy(), deck.to_string_lossy())
    }

    #[test]
    fn resolves_existing_directories() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("pc");
        let deck = dir.path().join("deck");
        fs::create_dir_all(&pc).unwrap();
        fs::create_dir_all(&deck).unwrap();

        let resolved = PathResolver::default().resolve(&spec(&pc, &deck)).unwrap();

        assert!(resolved.created.is_empty());
        assert!(resolved.pc_root.ends_with("pc"));
        assert!(resolved.deck_root.ends_with("deck"));
    }

    #[test]
    fn creates_missing_side_when_other_exists() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("pc");
        let deck = dir.path().join("deck").join("Celeste");
        fs::create_dir_all(&pc).unwrap();

        let resolved = PathResolver::default().resolve(&spec(&pc, &deck)).unwrap();

        assert_eq!(resolved.created, vec![Endpoint::Deck]);
        assert!(deck.is_dir());
    }

    #[test]
    fn dry_run_does_not_create() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("pc");
        let deck = dir.path().join("deck");
        fs::create_dir_all(&deck).unwrap();

        let resolved = PathResolver::default()
            .dry_run(true)
            .resolve(&spec(&pc, &deck))
            .unwrap();

        assert_eq!(resolved.created, vec![Endpoint::Pc]);
        assert!(!pc.exists());
    }

    #[test]
    fn both_missing_is_unavailable() {
        let dir = tempdir().unwrap();
        let result = PathResolver::default().resolve(&spec(&dir.path().join("a"), &dir.path().join("b")));
        assert!(matches!(result, Err(Error::PathUnavailable { .. })));
    }

    #[test]
    fn file_endpoint_is_unavailable() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("save.dat");
        fs::write(&pc, "x").unwrap();
        let deck = dir.path().join("deck");
        fs::create_dir_all(&deck).unwrap();

        let result = PathResolver::default().resolve(&spec(&pc, &deck));
        assert!(matches!(result, Err(Error::PathUnavailable { .. })));
    }

    #[test]
    fn same_directory_through_different_spelling_is_rejected() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("saves");
        fs::create_dir_all(&pc).unwrap();
        let deck = dir.path().join("saves").join(".");

        let result = PathResolver::default().resolve(&spec(&pc, &deck));
        assert!(matches!(result, Err(Error::SameEndpoint { .. })));
    }

    #[test]
    fn nested_endpoints_are_rejected() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("saves");
        let deck = pc.join("backup");
        fs::create_dir_all(&deck).unwrap();

        let result = PathResolver::default().resolve(&spec(&pc, &deck));
        assert!(matches!(result, Err(Error::OverlappingEndpoints { .. })));
    }

    #[test]
    fn missing_endpoint_inside_the_other_is_rejected_without_creating_it() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("deck");
        fs::create_dir_all(&deck).unwrap();
        let pc = deck.join("nested");

        let result = PathResolver::default().resolve(&spec(&pc, &deck));

        assert!(matches!(result, Err(Error::OverlappingEndpoints { .. })));
        assert!(!pc.exists());
    }

    #[cfg(unix)]
    #[test]
    fn dry_run_sees_nesting_through_a_symlinked_parent() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("pc");
        fs::create_dir_all(&pc).unwrap();
        std::os::unix::fs::symlink(&pc, dir.path().join("alias")).unwrap();
        let deck = dir.path().join("alias").join("deck");

        for dry_run in [true, false] {
            let result = PathResolver::default().dry_run(dry_run).resolve(&spec(&pc, &deck));
            assert!(matches!(result, Err(Error::OverlappingEndpoints { .. })), "dry_run={dry_run}");
        }
        assert!(!pc.join("deck").exists());
    }

    #[test]
    fn created_endpoint_matches_reported_root() {
        let dir = tempdir().unwrap();
        let pc = dir.path().join("pc");
        fs::create_dir_all(&pc).unwrap();
        let deck = dir.path().join("deck").join(".").join("Celeste");

        let resolved = PathResolver::default().resolve(&spec(&pc, &deck)).unwrap();

        assert!(resolved.deck_root.is_dir());
        assert_eq!(resolved.deck_root, dunce::canonicalize(&deck).unwrap());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pc")).unwrap();
        fs::create_dir_all(dir.path().join("deck")).unwrap();
        let relative = GameSyncSpec::new(9, "Relative", "pc", "deck");

        let resolved = PathResolver::new(Some(dir.path().to_path_buf()))
            .resolve(&relative)
            .unwrap();

        assert!(resolved.pc_root.is_absolute());
        assert!(resolved.pc_root.ends_with("pc"));
    }
}
