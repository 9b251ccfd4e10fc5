//! Per-game synchronization entries

use std::collections::BTreeSet;

use butler_fs::RelativePath;
use serde::{Deserialize, Serialize};

/// Which files of a game's save directory take part in synchronization.
///
/// `files: null` (or an empty list, or no key at all) in the configuration
/// means every regular file below the endpoint roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Option<Vec<String>>", into = "Option<Vec<String>>")]
pub enum FileFilter {
    #[default]
    AllFiles,
    /// Exact relative paths. Glob patterns are not interpreted.
    ExplicitList(BTreeSet<RelativePath>),
}

impl FileFilter {
    pub fn explicit<I, P>(paths: I) -> butler_fs::Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let set = paths
            .into_iter()
            .map(RelativePath::new)
            .collect::<butler_fs::Result<BTreeSet<_>>>()?;
        Ok(if set.is_empty() {
            Self::AllFiles
        } else {
            Self::ExplicitList(set)
        })
    }

    pub fn matches(&self, path: &RelativePath) -> bool {
        match self {
            Self::AllFiles => true,
            Self::ExplicitList(paths) => paths.contains(path),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::AllFiles)
    }
}

// Entries are user-typed, so Windows separators are accepted here.
impl TryFrom<Option<Vec<String>>> for FileFilter {
    type Error = butler_fs::Error;

    fn try_from(value: Option<Vec<String>>) -> butler_fs::Result<Self> {
        Self::explicit(value.unwrap_or_default())
    }
}

impl From<FileFilter> for Option<Vec<String>> {
    fn from(value: FileFilter) -> Self {
        match value {
            FileFilter::AllFiles => None,
            FileFilter::ExplicitList(paths) => Some(paths.into_iter().map(String::from).collect()),
        }
    }
}

/// One configured game: two endpoint directories and an optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSyncSpec {
    #[serde(rename = "_id")]
    pub id: u64,
    pub name: String,
    pub pc_path: String,
    pub deck_path: String,
    #[serde(default, rename = "files")]
    pub file_filter: FileFilter,
}

impl GameSyncSpec {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        pc_path: impl Into<String>,
        deck_path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pc_path: pc_path.into(),
            deck_path: deck_path.into(),
            file_filter: FileFilter::AllFiles,
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.file_filter = filter;
        self
    }
}
