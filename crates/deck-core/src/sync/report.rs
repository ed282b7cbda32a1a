//! Outcome of a sync pass

use deck_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::model::NoteId;
use crate::plan::{Category, PlanSummary};

/// Per-category item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CategoryCounts {
    /// Items that changed on disk (or would, in a dry run).
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.moved + self.deleted
    }
}

/// A single item that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<NormalizedPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<NoteId>,
    pub message: String,
}

/// Report from a sync pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether every planned item was applied
    pub success: bool,
    pub dry_run: bool,
    pub elapsed_ms: u64,
    /// Counts of the computed plan
    pub plan: PlanSummary,
    pub folders: CategoryCounts,
    pub notes: CategoryCounts,
    pub assets: CategoryCounts,
    pub indexes: CategoryCounts,
    /// Source notes that could not be placed in the tree
    pub source_skipped: usize,
    /// Notes written with the fallback renderer
    pub degraded: usize,
    /// Recoverable problems that did not fail an item
    pub warnings: Vec<String>,
    pub failures: Vec<ItemFailure>,
    /// Actions taken (or, in a dry run, that would be taken)
    pub actions: Vec<String>,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            success: true,
            dry_run,
            ..Self::default()
        }
    }

    pub fn counts(&self, category: Category) -> &CategoryCounts {
        match category {
            Category::Folder => &self.folders,
            Category::Note => &self.notes,
            Category::Asset => &self.assets,
            Category::Index => &self.indexes,
        }
    }

    pub fn counts_mut(&mut self, category: Category) -> &mut CategoryCounts {
        match category {
            Category::Folder => &mut self.folders,
            Category::Note => &mut self.notes,
            Category::Asset => &mut self.assets,
            Category::Index => &mut self.indexes,
        }
    }

    /// Total number of changed items across all categories.
    pub fn total_changed(&self) -> usize {
        [&self.folders, &self.notes, &self.assets, &self.indexes]
            .iter()
            .map(|c| c.changed())
            .sum()
    }

    pub fn record_action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    pub fn record_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn record_failure(&mut self, failure: ItemFailure) {
        tracing::warn!(
            category = %failure.category,
            path = ?failure.path,
            note_id = ?failure.note_id,
            "{}",
            failure.message
        );
        self.counts_mut(failure.category).failed += 1;
        self.success = false;
        self.failures.push(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_mark_report_unsuccessful() {
        let mut report = SyncReport::new(false);
        assert!(report.success);

        report.notes.created = 2;
        report.folders.created = 1;
        report.record_failure(ItemFailure {
            category: Category::Asset,
            path: Some(NormalizedPath::new("assets/a.png")),
            note_id: None,
            message: "permission denied".to_string(),
        });

        assert!(!report.success);
        assert_eq!(report.counts(Category::Asset).failed, 1);
        assert_eq!(report.total_changed(), 3);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn serializes_counts_per_category() {
        let mut report = SyncReport::new(true);
        report.indexes.updated = 1;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["indexes"]["updated"], 1);
        assert_eq!(json["notes"]["created"], 0);
    }
}
