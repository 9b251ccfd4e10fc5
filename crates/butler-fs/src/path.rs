//! Normalized path handling for cross-platform compatibility

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and collapses repeated
    /// separators. A leading `//` (network share) is preserved.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: collapse_separators(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if segment.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.is_empty() || self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self {
            inner: collapse_separators(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

fn collapse_separators(raw: &str) -> String {
    let (prefix, rest) = if raw.starts_with("//") && !raw.starts_with("///") {
        ("//", &raw[2..])
    } else {
        ("", raw)
    };
    let mut out = String::with_capacity(raw.len());
    out.push_str(prefix);
    let mut last_was_slash = false;
    for ch in rest.chars() {
        if ch == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(ch);
    }
    out
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// A validated path relative to an endpoint root.
///
/// Always forward-slash separated, never empty, never absolute and never
/// escaping its root through `..`. This is the key of every manifest, so the
/// ordering is plain string ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Parse and normalize a user-supplied relative path.
    ///
    /// `\` is read as a separator, `.` segments and repeated separators are
    /// dropped. Use [`from_key`](Self::from_key) for names taken from disk.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let unified = raw.replace('\\', "/");
        if unified.len() >= 2 && unified.as_bytes()[1] == b':' {
            return Err(invalid_relative(raw, "drive prefixes are not allowed"));
        }
        Self::from_segments(raw, &unified)
    }

    /// Parse a manifest key exactly as stored. Only `/` separates segments;
    /// a `\` stays part of the file name.
    pub fn from_key(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        Self::from_segments(raw, raw)
    }

    fn from_segments(raw: &str, unified: &str) -> Result<Self> {
        if unified.starts_with('/') {
            return Err(invalid_relative(raw, "absolute paths are not allowed"));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(invalid_relative(raw, "parent directory segments are not allowed")),
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(invalid_relative(raw, "path is empty"));
        }
        Ok(Self(segments.join("/")))
    }

    /// Build the manifest key of a file located under `root` from its real
    /// path components.
    ///
    /// Fails for names that are not valid UTF-8, since they have no key.
    pub fn from_root(root: &Path, full: &Path) -> Result<Self> {
        let display = full.display().to_string();
        let rel = full
            .strip_prefix(root)
            .map_err(|_| invalid_relative(&display, &format!("not located under {}", root.display())))?;

        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| invalid_relative(&display, "path is not valid UTF-8"))?;
                    segments.push(part);
                }
                Component::CurDir => {}
                _ => return Err(invalid_relative(&display, "unexpected path component")),
            }
        }
        Self::from_key(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve this path under an endpoint root using native separators.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.0.split('/') {
            out.push(segment);
        }
        out
    }
}

fn invalid_relative(path: &str, reason: &str) -> Error {
    Error::InvalidRelativePath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_key(value)
    }
}

impl From<RelativePath> for String {
    fn from(value: RelativePath) -> Self {
        value.0
    }
}

impl std::str::FromStr for RelativePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
