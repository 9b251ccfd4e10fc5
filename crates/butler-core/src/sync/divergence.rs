//! Three-way classification of PC, Deck and LastSynced manifests

use std::collections::{BTreeMap, BTreeSet};

use butler_fs::RelativePath;
use serde::{Deserialize, Serialize};

use crate::snapshot::manifest_same_state as same_state;
use crate::snapshot::{FileManifestEntry, Manifest};

/// How a path differs between the endpoints relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceClass {
    Unchanged,
    AddedOnPc,
    AddedOnDeck,
    ModifiedOnPc,
    ModifiedOnDeck,
    DeletedOnPc,
    DeletedOnDeck,
    ConflictBothModified,
    ConflictOneModifiedOneDeleted,
}

impl DivergenceClass {
    pub fn is_conflict(self) -> bool {
        matches!(
            self,
            Self::ConflictBothModified | Self::ConflictOneModifiedOneDeleted
        )
    }
}

/// Classify one path from its three (possibly absent) entries.
pub fn classify(
    pc: Option<&FileManifestEntry>,
    deck: Option<&FileManifestEntry>,
    last: Option<&FileManifestEntry>,
) -> DivergenceClass {
    use DivergenceClass::*;

    if same_state(pc, deck) {
        return Unchanged;
    }

    let Some(last) = last else {
        // No baseline to arbitrate with
        return match (pc, deck) {
            (Some(_), None) => AddedOnPc,
            (None, Some(_)) => AddedOnDeck,
            _ => ConflictBothModified,
        };
    };

    let pc_changed = !same_state(pc, Some(last));
    let deck_changed = !same_state(deck, Some(last));

    match (pc_changed, deck_changed) {
        (true, false) if pc.is_none() => DeletedOnPc,
        (true, false) => ModifiedOnPc,
        (false, true) if deck.is_none() => DeletedOnDeck,
        (false, true) => ModifiedOnDeck,
        _ if pc.is_none() || deck.is_none() => ConflictOneModifiedOneDeleted,
        _ => ConflictBothModified,
    }
}

/// Classifies every path in the union of the three manifests.
///
/// Pure: the same inputs always yield the same map.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivergenceAnalyzer;

impl DivergenceAnalyzer {
    pub fn analyze(
        &self,
        pc: &Manifest,
        deck: &Manifest,
        last: Option<&Manifest>,
    ) -> BTreeMap<RelativePath, DivergenceClass> {
        let mut paths: BTreeSet<&RelativePath> = pc.paths().chain(deck.paths()).collect();
        if let Some(last) = last {
            paths.extend(last.paths());
        }

        paths
            .into_iter()
            .map(|path| {
                let class = classify(
                    pc.get(path),
                    deck.get(path),
                    last.and_then(|l| l.get(path)),
                );
                (path.clone(), class)
            })
            .collect()
    }
}
