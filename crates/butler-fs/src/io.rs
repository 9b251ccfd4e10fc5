//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Suffix carried by every staging file created by [`stage_copy`].
pub const STAGING_SUFFIX: &str = ".butler-stage";

/// Tuning knobs for locked atomic writes.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// How long to keep retrying the advisory lock before giving up.
    pub lock_timeout: Duration,
    /// Flush file contents to disk before the rename.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Concurrent writers are serialized through an exclusive advisory lock on a
/// sidecar `<file>.lock`, retried with exponential backoff until
/// `config.lock_timeout` elapses.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock_path = PathBuf::from(format!("{}.lock", native_path.display()));
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;
    acquire_exclusive(&lock_file, &native_path, config.lock_timeout)?;

    // Temp file lives in the same directory so the rename never crosses filesystems
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let written = write_temp(&temp_path, content, config.enable_fsync)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));
    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    FileExt::unlock(&lock_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    written
}

fn write_temp(temp_path: &Path, content: &[u8], fsync: bool) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    if fsync {
        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }
    Ok(())
}

fn acquire_exclusive(lock_file: &File, target: &Path, timeout: Duration) -> Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(10))
        .with_max_interval(Duration::from_millis(250))
        .with_max_elapsed_time(Some(timeout))
        .build();

    backoff::retry(policy, || {
        FileExt::try_lock_exclusive(lock_file).map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Expectations checked on a staged copy before it is committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageOptions {
    /// Size recorded when the source was snapshotted. A mismatch aborts the copy.
    pub expected_size: Option<u64>,
    /// Modification time stamped onto the staged file before it is committed.
    pub modified: Option<SystemTime>,
    /// Flush the staged file to disk before the rename.
    pub fsync: bool,
}

/// Hidden sibling path used to stage a copy into `dst`.
pub fn staging_path_for(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!(".{}.{}{}", name, uuid::Uuid::new_v4().simple(), STAGING_SUFFIX))
}

/// Whether a file name belongs to a staging file left behind by [`stage_copy`].
pub fn is_staging_artifact(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(STAGING_SUFFIX)
}

/// Copy `src` over `dst` so that `dst` is never observed half-written.
///
/// The content is written to a staging sibling of `dst`, checked against
/// `options.expected_size`, stamped with `options.modified`, and only then
/// renamed into place. On any failure the staging file is removed and `dst`
/// keeps its previous content. Returns the number of bytes copied.
pub fn stage_copy(src: &Path, dst: &Path, options: StageOptions) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let staging = staging_path_for(dst);
    let staged = write_staged(src, &staging, options);
    let committed = staged.and_then(|copied| {
        fs::rename(&staging, dst)
            .map(|()| copied)
            .map_err(|e| Error::io(dst, e))
    });

    if committed.is_err() {
        let _ = fs::remove_file(&staging);
    }
    committed
}

fn write_staged(src: &Path, staging: &Path, options: StageOptions) -> Result<u64> {
    let mut reader = File::open(src).map_err(|e| Error::io(src, e))?;
    let permissions = reader
        .metadata()
        .map_err(|e| Error::io(src, e))?
        .permissions();

    let mut out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .map_err(|e| Error::io(staging, e))?;

    let copied = std::io::copy(&mut reader, &mut out).map_err(|e| Error::io(staging, e))?;
    if let Some(expected) = options.expected_size
        && copied != expected
    {
        return Err(Error::SizeMismatch {
            path: src.to_path_buf(),
            expected,
            actual: copied,
        });
    }

    if let Some(modified) = options.modified {
        out.set_modified(modified)
            .map_err(|e| Error::io(staging, e))?;
    }
    if options.fsync {
        out.sync_all().map_err(|e| Error::io(staging, e))?;
    }
    drop(out);

    fs::set_permissions(staging, permissions).map_err(|e| Error::io(staging, e))?;
    Ok(copied)
}

/// Remove a file. Returns `false` when it was already gone.
pub fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}
