//! Arbitration of paths changed on both endpoints
//!
//! Never touches the filesystem; it only picks a [`SyncAction`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use butler_fs::RelativePath;

use super::divergence::DivergenceClass;
use super::plan::{PlannedAction, SyncAction, SyncPlan};
use crate::config::ConflictPolicy;
use crate::resolver::Endpoint;
use crate::snapshot::{FileManifestEntry, Manifest};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Turn classifications into a complete plan.
    pub fn plan(
        &self,
        classes: &BTreeMap<RelativePath, DivergenceClass>,
        pc: &Manifest,
        deck: &Manifest,
    ) -> SyncPlan {
        classes
            .iter()
            .map(|(path, &class)| {
                let action = SyncAction::for_class(class)
                    .unwrap_or_else(|| self.resolve(class, pc.get(path), deck.get(path)));
                if action == SyncAction::SkipConflict {
                    tracing::warn!(path = %path, ?class, "Conflict left for the user");
                }
                (path.clone(), PlannedAction { class, action })
            })
            .collect()
    }

    /// Pick an action for one conflicting path.
    pub fn resolve(
        &self,
        class: DivergenceClass,
        pc: Option<&FileManifestEntry>,
        deck: Option<&FileManifestEntry>,
    ) -> SyncAction {
        match self.policy {
            ConflictPolicy::Manual => SyncAction::SkipConflict,
            ConflictPolicy::PreferPc => prefer(Endpoint::Pc, pc),
            ConflictPolicy::PreferDeck => prefer(Endpoint::Deck, deck),
            ConflictPolicy::NewerWins => newer_wins(class, pc, deck),
        }
    }
}

/// Make the other side match `winner`, whose entry may be absent (deleted).
fn prefer(winner: Endpoint, winner_entry: Option<&FileManifestEntry>) -> SyncAction {
    match winner_entry {
        Some(_) => SyncAction::copy_to(winner.other()),
        None => SyncAction::delete_on(winner.other()),
    }
}

fn newer_wins(
    class: DivergenceClass,
    pc: Option<&FileManifestEntry>,
    deck: Option<&FileManifestEntry>,
) -> SyncAction {
    match (class, pc, deck) {
        (DivergenceClass::ConflictBothModified, Some(pc), Some(deck)) => {
            match (pc.modified, deck.modified) {
                (Some(p), Some(d)) => match p.cmp(&d) {
                    Ordering::Greater => SyncAction::CopyToDeck,
                    Ordering::Less => SyncAction::CopyToPc,
                    Ordering::Equal => SyncAction::SkipConflict,
                },
                _ => SyncAction::SkipConflict,
            }
        }
        // The deletion carries no timestamp: restore the surviving edit
        (DivergenceClass::ConflictOneModifiedOneDeleted, Some(survivor), None)
            if survivor.modified.is_some() =>
        {
            SyncAction::CopyToDeck
        }
        (DivergenceClass::ConflictOneModifiedOneDeleted, None, Some(survivor))
            if survivor.modified.is_some() =>
        {
            SyncAction::CopyToPc
        }
        _ => SyncAction::SkipConflict,
    }
}
