//! Typed set of mutations computed by the diff engine for one pass

use std::collections::BTreeSet;
use std::fmt;

use deck_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::model::NoteId;

/// Kind of destination item an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Folder,
    Note,
    Asset,
    Index,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Folder => "folder",
            Self::Note => "note",
            Self::Asset => "asset",
            Self::Index => "index",
        })
    }
}

/// A note with no file in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteCreate {
    pub note_id: NoteId,
    pub target: NormalizedPath,
}

/// A note whose file must be rewritten, moved, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteUpdate {
    pub note_id: NoteId,
    /// Canonical path for the note
    pub target: NormalizedPath,
    /// Where the note's file currently is
    pub current: NormalizedPath,
    pub needs_move: bool,
    /// Source is newer than the file, or either timestamp is unknown
    pub stale: bool,
}

/// A managed note file with no counterpart in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDelete {
    pub path: NormalizedPath,
    pub note_id: NoteId,
}

/// A note whose target path is taken by a file without an identity block.
/// The file is left alone and the note is not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteConflict {
    pub note_id: NoteId,
    pub path: NormalizedPath,
}

/// All mutations for one pass. Every collection is ordered by identity or path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionPlan {
    pub folders_to_create: BTreeSet<NormalizedPath>,
    pub notes_to_create: Vec<NoteCreate>,
    pub notes_to_update: Vec<NoteUpdate>,
    pub notes_to_delete: Vec<NoteDelete>,
    pub assets_to_copy: BTreeSet<String>,
    pub assets_to_delete: BTreeSet<String>,
    pub indexes_to_create: BTreeSet<NormalizedPath>,
    pub indexes_to_update: BTreeSet<NormalizedPath>,
    pub indexes_to_delete: BTreeSet<NormalizedPath>,
    /// Notes held back by an unmanaged file; reported, never applied
    pub notes_blocked: Vec<NoteConflict>,
}

/// Item counts of an [`ActionPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub folders_to_create: usize,
    pub notes_to_create: usize,
    pub notes_to_update: usize,
    pub notes_to_move: usize,
    pub notes_to_delete: usize,
    pub assets_to_copy: usize,
    pub assets_to_delete: usize,
    pub indexes_to_create: usize,
    pub indexes_to_update: usize,
    pub indexes_to_delete: usize,
    #[serde(default)]
    pub notes_blocked: usize,
}

impl PlanSummary {
    /// Number of planned mutations. Blocked notes are not mutations.
    pub fn total(&self) -> usize {
        self.folders_to_create
            + self.notes_to_create
            + self.notes_to_update
            + self.notes_to_delete
            + self.assets_to_copy
            + self.assets_to_delete
            + self.indexes_to_create
            + self.indexes_to_update
            + self.indexes_to_delete
    }
}

/// Direction of a planned change, for previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Remove,
}

/// One line of a plan preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub kind: ChangeKind,
    pub category: Category,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PlannedChange {
    fn new(kind: ChangeKind, category: Category, path: impl fmt::Display) -> Self {
        Self {
            kind,
            category,
            path: path.to_string(),
            detail: None,
        }
    }
}

impl ActionPlan {
    /// Whether every non-index category is empty.
    pub fn has_content_changes(&self) -> bool {
        !(self.folders_to_create.is_empty()
            && self.notes_to_create.is_empty()
            && self.notes_to_update.is_empty()
            && self.notes_to_delete.is_empty()
            && self.assets_to_copy.is_empty()
            && self.assets_to_delete.is_empty())
    }

    /// Whether nothing would be written. Blocked notes do not count.
    pub fn is_empty(&self) -> bool {
        !self.has_content_changes()
            && self.indexes_to_create.is_empty()
            && self.indexes_to_update.is_empty()
            && self.indexes_to_delete.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            folders_to_create: self.folders_to_create.len(),
            notes_to_create: self.notes_to_create.len(),
            notes_to_update: self.notes_to_update.len(),
            notes_to_move: self.notes_to_update.iter().filter(|u| u.needs_move).count(),
            notes_to_delete: self.notes_to_delete.len(),
            assets_to_copy: self.assets_to_copy.len(),
            assets_to_delete: self.assets_to_delete.len(),
            indexes_to_create: self.indexes_to_create.len(),
            indexes_to_update: self.indexes_to_update.len(),
            indexes_to_delete: self.indexes_to_delete.len(),
            notes_blocked: self.notes_blocked.len(),
        }
    }

    /// Flat preview of the plan in execution order.
    pub fn changes(&self, assets_folder: &str) -> Vec<PlannedChange> {
        use ChangeKind::*;

        let assets = NormalizedPath::new(assets_folder);
        let mut changes = Vec::with_capacity(self.summary().total());

        changes.extend(
            self.folders_to_create
                .iter()
                .map(|p| PlannedChange::new(Add, Category::Folder, p)),
        );
        changes.extend(
            self.notes_to_delete
                .iter()
                .map(|d| PlannedChange::new(Remove, Category::Note, &d.path)),
        );
        changes.extend(
            self.assets_to_delete
                .iter()
                .map(|a| PlannedChange::new(Remove, Category::Asset, assets.join(a))),
        );
        changes.extend(
            self.indexes_to_delete
                .iter()
                .map(|p| PlannedChange::new(Remove, Category::Index, p)),
        );
        changes.extend(
            self.assets_to_copy
                .iter()
                .map(|a| PlannedChange::new(Add, Category::Asset, assets.join(a))),
        );
        changes.extend(
            self.notes_to_create
                .iter()
                .map(|c| PlannedChange::new(Add, Category::Note, &c.target)),
        );
        changes.extend(self.notes_to_update.iter().map(|u| {
            let mut change = PlannedChange::new(Modify, Category::Note, &u.target);
            if u.needs_move {
                change.detail = Some(format!("moved from {}", u.current));
            }
            change
        }));
        changes.extend(
            self.indexes_to_create
                .iter()
                .map(|p| PlannedChange::new(Add, Category::Index, p)),
        );
        changes.extend(
            self.indexes_to_update
                .iter()
                .map(|p| PlannedChange::new(Modify, Category::Index, p)),
        );
        changes
    }
}
