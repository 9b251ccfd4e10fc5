//! Resolved per-path instructions

use std::collections::BTreeMap;
use std::fmt;

use butler_fs::RelativePath;
use serde::{Deserialize, Serialize};

use super::divergence::DivergenceClass;
use crate::resolver::Endpoint;

/// What the executor does with one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    CopyToDeck,
    CopyToPc,
    DeleteOnDeck,
    DeleteOnPc,
    Skip,
    /// Left for the user to decide
    SkipConflict,
}

impl SyncAction {
    /// Action implied by a non-conflicting class.
    pub fn for_class(class: DivergenceClass) -> Option<Self> {
        use DivergenceClass::*;
        match class {
            Unchanged => Some(Self::Skip),
            AddedOnPc | ModifiedOnPc => Some(Self::CopyToDeck),
            AddedOnDeck | ModifiedOnDeck => Some(Self::CopyToPc),
            DeletedOnPc => Some(Self::DeleteOnDeck),
            DeletedOnDeck => Some(Self::DeleteOnPc),
            ConflictBothModified | ConflictOneModifiedOneDeleted => None,
        }
    }

    /// Copy that makes `target` match the other endpoint.
    pub fn copy_to(target: Endpoint) -> Self {
        match target {
            Endpoint::Pc => Self::CopyToPc,
            Endpoint::Deck => Self::CopyToDeck,
        }
    }

    /// Delete on `target`.
    pub fn delete_on(target: Endpoint) -> Self {
        match target {
            Endpoint::Pc => Self::DeleteOnPc,
            Endpoint::Deck => Self::DeleteOnDeck,
        }
    }

    pub fn is_delete(self) -> bool {
        matches!(self, Self::DeleteOnDeck | Self::DeleteOnPc)
    }

    pub fn is_copy(self) -> bool {
        matches!(self, Self::CopyToDeck | Self::CopyToPc)
    }

    /// Endpoint whose filesystem this action mutates.
    pub fn target(self) -> Option<Endpoint> {
        match self {
            Self::CopyToDeck | Self::DeleteOnDeck => Some(Endpoint::Deck),
            Self::CopyToPc | Self::DeleteOnPc => Some(Endpoint::Pc),
            Self::Skip | Self::SkipConflict => None,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CopyToDeck => "copy PC -> Deck",
            Self::CopyToPc => "copy Deck -> PC",
            Self::DeleteOnDeck => "delete on Deck",
            Self::DeleteOnPc => "delete on PC",
            Self::Skip => "skip",
            Self::SkipConflict => "conflict (skipped)",
        };
        f.write_str(label)
    }
}

/// Classification and resolved action of one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub class: DivergenceClass,
    pub action: SyncAction,
}

/// Per-path actions for one game
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    entries: BTreeMap<RelativePath, PlannedAction>,
}

impl SyncPlan {
    pub fn insert(&mut self, path: RelativePath, planned: PlannedAction) {
        self.entries.insert(path, planned);
    }

    pub fn get(&self, path: &RelativePath) -> Option<&PlannedAction> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &PlannedAction)> {
        self.entries.iter()
    }

    /// Paths with a filesystem action, deletions first, each group in path order.
    pub fn execution_order(&self) -> Vec<(&RelativePath, SyncAction)> {
        let deletes = self.entries.iter().filter(|(_, p)| p.action.is_delete());
        let copies = self.entries.iter().filter(|(_, p)| p.action.is_copy());
        deletes.chain(copies).map(|(path, p)| (path, p.action)).collect()
    }

    /// Paths left unresolved for the user.
    pub fn conflicts(&self) -> Vec<RelativePath> {
        self.entries
            .iter()
            .filter(|(_, p)| p.action == SyncAction::SkipConflict)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// True when every path is `Skip`.
    pub fn is_noop(&self) -> bool {
        self.entries.values().all(|p| p.action == SyncAction::Skip)
    }
}

impl FromIterator<(RelativePath, PlannedAction)> for SyncPlan {
    fn from_iter<I: IntoIterator<Item = (RelativePath, PlannedAction)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(action: SyncAction) -> PlannedAction {
        PlannedAction {
            class: DivergenceClass::Unchanged,
            action,
        }
    }

    #[test]
    fn deletions_come_before_copies() {
        let p = |s: &str| RelativePath::new(s).unwrap();
        let plan: SyncPlan = [
            (p("a.sav"), planned(SyncAction::CopyToDeck)),
            (p("b.sav"), planned(SyncAction::DeleteOnDeck)),
            (p("c.sav"), planned(SyncAction::Skip)),
            (p("d.sav"), planned(SyncAction::CopyToPc)),
            (p("e.sav"), planned(SyncAction::DeleteOnPc)),
            (p("f.sav"), planned(SyncAction::SkipConflict)),
        ]
        .into_iter()
        .collect();

        let order: Vec<_> = plan
            .execution_order()
            .into_iter()
            .map(|(path, _)| path.as_str().to_string())
            .collect();

        assert_eq!(order, vec!["b.sav", "e.sav", "a.sav", "d.sav"]);
        assert_eq!(plan.conflicts(), vec![p("f.sav")]);
        assert!(!plan.is_noop());
    }

    #[test]
    fn every_plain_class_has_an_action() {
        use DivergenceClass::*;
        for class in [
            Unchanged,
            AddedOnPc,
            AddedOnDeck,
            ModifiedOnPc,
            ModifiedOnDeck,
            DeletedOnPc,
            DeletedOnDeck,
        ] {
            assert!(SyncAction::for_class(class).is_some(), "{:?}", class);
        }
        assert_eq!(SyncAction::for_class(ConflictBothModified), None);
        assert_eq!(SyncAction::for_class(DeletedOnPc), Some(SyncAction::DeleteOnDeck));
    }
}
