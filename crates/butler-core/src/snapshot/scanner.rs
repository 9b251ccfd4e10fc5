use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use butler_fs::RelativePath;
use butler_fs::checksum::compute_file_checksum;
use butler_fs::io::is_staging_artifact;
use walkdir::WalkDir;

use super::{FileManifestEntry, Manifest};
use crate::config::FileFilter;
use crate::{Error, Result};

/// Result of scanning one endpoint
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub manifest: Manifest,
    /// Staging files left behind by an interrupted transfer
    pub stale_staging: Vec<PathBuf>,
    /// Files whose fingerprint was taken from the hint instead of re-hashed
    pub reused_fingerprints: usize,
}

/// Walks an endpoint root and produces its [`Manifest`].
///
/// Only regular files are recorded; symlinks and special files are skipped,
/// as are files whose names are not valid UTF-8.
/// A baseline manifest may be supplied as a hint: files whose size and
/// modification time match the hint exactly reuse its fingerprint.
#[derive(Debug, Clone)]
pub struct Snapshotter {
    filter: FileFilter,
    verify_hashes: bool,
}

impl Snapshotter {
    pub fn new(filter: FileFilter) -> Self {
        Self {
            filter,
            verify_hashes: false,
        }
    }

    /// Always re-hash, never trust the hint.
    pub fn verify_hashes(mut self, verify: bool) -> Self {
        self.verify_hashes = verify;
        self
    }

    /// Scan `root`. A root that does not exist yields an empty manifest.
    pub fn scan(&self, root: &Path, hint: Option<&Manifest>) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::scan(root, "not a directory")),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(outcome),
            Err(e) => return Err(Error::scan(root, e)),
        }

        match &self.filter {
            FileFilter::AllFiles => self.walk(root, hint, &mut outcome)?,
            FileFilter::ExplicitList(paths) => {
                for rel in paths {
                    self.stat_listed(root, rel, hint, &mut outcome)?;
                }
            }
        }

        tracing::debug!(
            ?root,
            files = outcome.manifest.len(),
            bytes = outcome.manifest.total_size(),
            reused = outcome.reused_fingerprints,
            "Scanned endpoint"
        );
        Ok(outcome)
    }

    fn walk(&self, root: &Path, hint: Option<&Manifest>, outcome: &mut ScanOutcome) -> Result<()> {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| Error::scan(root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_staging_artifact(&name) {
                outcome.stale_staging.push(entry.path().to_path_buf());
                continue;
            }

            let rel = match RelativePath::from_root(root, entry.path()) {
                Ok(rel) => rel,
                Err(e) => {
                    tracing::warn!(path = ?entry.path(), error = %e, "File name has no manifest key, skipping");
                    continue;
                }
            };
            let meta = entry.metadata().map_err(|e| Error::scan(root, e))?;
            self.record(root, rel, entry.path(), &meta, hint, outcome)?;
        }
        Ok(())
    }

    fn stat_listed(
        &self,
        root: &Path,
        rel: &RelativePath,
        hint: Option<&Manifest>,
        outcome: &mut ScanOutcome,
    ) -> Result<()> {
        let full = rel.under(root);
        let meta = match fs::symlink_metadata(&full) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::scan(root, format!("{}: {}", rel, e))),
        };
        if !meta.file_type().is_file() {
            tracing::debug!(path = %rel, "Listed path is not a regular file, skipping");
            return Ok(());
        }
        self.record(root, rel.clone(), &full, &meta, hint, outcome)
    }

    fn record(
        &self,
        root: &Path,
        rel: RelativePath,
        full: &Path,
        meta: &fs::Metadata,
        hint: Option<&Manifest>,
        outcome: &mut ScanOutcome,
    ) -> Result<()> {
        let size = meta.len();
        let modified = meta.modified().ok();
        let mut entry = FileManifestEntry::new(size, modified, String::new());

        let cached = hint
            .filter(|_| !self.verify_hashes)
            .and_then(|h| h.get(&rel))
            .filter(|known| {
                known.size == entry.size && known.modified.is_some() && known.modified == entry.modified
            });

        entry.fingerprint = match cached {
            Some(known) => {
                outcome.reused_fingerprints += 1;
                known.fingerprint.clone()
            }
            None => compute_file_checksum(full)
                .map_err(|e| Error::scan(root, format!("{}: {}", rel, e)))?,
        };

        outcome.manifest.insert(rel, entry);
        Ok(())
    }
}
