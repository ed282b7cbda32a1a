//! Applies an action plan to the destination in five ordered phases
//!
//! 1. Folder creation
//! 2. Deletion of obsolete notes, assets and index documents
//! 3. Asset copy from the media store
//! 4. Note writes (creates, then updates and moves)
//! 5. Index generation
//!
//! A failing item is recorded in the report and never stops its phase.

use std::path::{Path, PathBuf};

use deck_fs::{NormalizedPath, content_hash, io};

use crate::frontmatter::{NoteFrontmatter, render_note_file};
use crate::index::IndexGenerator;
use crate::media::MediaStore;
use crate::model::NoteId;
use crate::plan::{ActionPlan, Category};
use crate::progress::ProgressSink;
use crate::render::{NoteRenderer, degraded_body};
use crate::source::SourceState;

use super::report::{ItemFailure, SyncReport};

/// How a written note is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteWrite {
    Create,
    Update,
    Move,
}

impl NoteWrite {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Move => "move",
        }
    }
}

pub(crate) struct PlanExecutor<'a> {
    pub root: &'a Path,
    pub assets_folder: &'a str,
    pub source: &'a SourceState,
    pub media: &'a dyn MediaStore,
    pub renderer: &'a dyn NoteRenderer,
    pub progress: &'a dyn ProgressSink,
    pub dry_run: bool,
}

impl PlanExecutor<'_> {
    pub fn execute(&self, plan: &ActionPlan, report: &mut SyncReport) {
        self.create_folders(plan, report);
        self.delete_obsolete(plan, report);
        self.copy_assets(plan, report);
        self.write_notes(plan, report);
        self.write_indexes(plan, report);
    }

    fn absolute(&self, path: &NormalizedPath) -> PathBuf {
        path.resolve(self.root)
    }

    fn asset_path(&self, name: &str) -> PathBuf {
        self.root.join(self.assets_folder).join(name)
    }

    /// Record a planned change; returns false in a dry run.
    fn should_apply(&self, report: &mut SyncReport, action: String) -> bool {
        if self.dry_run {
            report.record_action(format!("[dry-run] Would {action}"));
            false
        } else {
            true
        }
    }

    fn create_folders(&self, plan: &ActionPlan, report: &mut SyncReport) {
        let total = plan.folders_to_create.len();
        for (i, folder) in plan.folders_to_create.iter().enumerate() {
            self.progress.report("Creating folders", i + 1, total);
            if self.should_apply(report, format!("create folder {folder}")) {
                if let Err(e) = io::ensure_dir(&self.absolute(folder)) {
                    report.record_failure(failure(Category::Folder, Some(folder), None, e));
                    continue;
                }
                report.record_action(format!("Created folder {folder}"));
            }
            report.folders.created += 1;
        }
    }

    fn delete_obsolete(&self, plan: &ActionPlan, report: &mut SyncReport) {
        let total =
            plan.notes_to_delete.len() + plan.assets_to_delete.len() + plan.indexes_to_delete.len();
        let mut done = 0;

        for delete in &plan.notes_to_delete {
            done += 1;
            self.progress.report("Deleting obsolete files", done, total);
            self.delete_file(
                report,
                Category::Note,
                &delete.path,
                Some(delete.note_id),
                self.absolute(&delete.path),
            );
        }
        for asset in &plan.assets_to_delete {
            done += 1;
            self.progress.report("Deleting obsolete files", done, total);
            let path = NormalizedPath::new(self.assets_folder).join(asset);
            self.delete_file(report, Category::Asset, &path, None, self.asset_path(asset));
        }
        for index in &plan.indexes_to_delete {
            done += 1;
            self.progress.report("Deleting obsolete files", done, total);
            self.delete_file(report, Category::Index, index, None, self.absolute(index));
        }
    }

    fn delete_file(
        &self,
        report: &mut SyncReport,
        category: Category,
        path: &NormalizedPath,
        note_id: Option<NoteId>,
        absolute: PathBuf,
    ) {
        if !self.should_apply(report, format!("delete {category} {path}")) {
            report.counts_mut(category).deleted += 1;
            return;
        }
        match io::remove_file(&absolute) {
            Ok(true) => {
                report.record_action(format!("Deleted {category} {path}"));
                report.counts_mut(category).deleted += 1;
            }
            Ok(false) => {
                tracing::debug!(%path, "Already absent");
                report.counts_mut(category).skipped += 1;
            }
            Err(e) => report.record_failure(failure(category, Some(path), note_id, e)),
        }
    }

    fn copy_assets(&self, plan: &ActionPlan, report: &mut SyncReport) {
        let total = plan.assets_to_copy.len();
        for (i, name) in plan.assets_to_copy.iter().enumerate() {
            self.progress.report("Copying assets", i + 1, total);
            let path = NormalizedPath::new(self.assets_folder).join(name);
            let destination = self.asset_path(name);

            if destination.exists() {
                report.assets.skipped += 1;
                continue;
            }
            if !self.media.exists(name) {
                report.record_warning(format!("Media file {name} not found in the media store"));
                report.assets.skipped += 1;
                continue;
            }
            if !self.should_apply(report, format!("copy asset {path}")) {
                report.assets.created += 1;
                continue;
            }

            let copied = self
                .media
                .open(name)
                .map_err(|e| deck_fs::Error::io(&destination, e))
                .and_then(|mut reader| io::write_atomic_from(&destination, &mut reader));
            match copied {
                Ok(bytes) => {
                    tracing::debug!(%path, bytes, "Copied asset");
                    report.record_action(format!("Copied asset {path}"));
                    report.assets.created += 1;
                }
                Err(e) => report.record_failure(failure(Category::Asset, Some(&path), None, e)),
            }
        }
    }

    fn write_notes(&self, plan: &ActionPlan, report: &mut SyncReport) {
        let total = plan.notes_to_create.len() + plan.notes_to_update.len();
        let mut done = 0;

        for create in &plan.notes_to_create {
            done += 1;
            self.progress.report("Writing notes", done, total);
            self.write_note(report, create.note_id, &create.target, NoteWrite::Create);
        }

        for update in &plan.notes_to_update {
            done += 1;
            self.progress.report("Writing notes", done, total);

            if !update.needs_move {
                self.write_note(report, update.note_id, &update.target, NoteWrite::Update);
                continue;
            }
            if !self.dry_run
                && let Err(e) = io::remove_file(&self.absolute(&update.current))
            {
                report.record_failure(failure(
                    Category::Note,
                    Some(&update.current),
                    Some(update.note_id),
                    format!("cannot move to {}: {e}", update.target),
                ));
                continue;
            }
            self.write_note(report, update.note_id, &update.target, NoteWrite::Move);
        }
    }

    fn write_note(&self, report: &mut SyncReport, note_id: NoteId, target: &NormalizedPath, kind: NoteWrite) {
        let Some((_, note)) = self.source.note(note_id) else {
            report.record_failure(failure(
                Category::Note,
                Some(target),
                Some(note_id),
                "note missing from source state",
            ));
            return;
        };

        let counts = |report: &mut SyncReport| {
            let notes = &mut report.notes;
            match kind {
                NoteWrite::Create => notes.created += 1,
                NoteWrite::Update => notes.updated += 1,
                NoteWrite::Move => notes.moved += 1,
            }
        };

        if !self.should_apply(report, format!("{} note {target}", kind.verb())) {
            counts(report);
            return;
        }

        let body = match self.renderer.render(note) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(note_id, error = %e, "Renderer failed, using plain text");
                report.degraded += 1;
                degraded_body(note)
            }
        };
        let meta = NoteFrontmatter {
            anki_note_id: note.id,
            anki_note_mod: note.mod_time,
            content_hash: content_hash(&body),
        };

        let written = render_note_file(&meta, &body)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                io::write_text(&self.absolute(target), &content).map_err(|e| e.to_string())
            });
        match written {
            Ok(()) => {
                report.record_action(format!("Wrote note {target}"));
                counts(report);
            }
            Err(e) => report.record_failure(failure(Category::Note, Some(target), Some(note_id), e)),
        }
    }

    fn write_indexes(&self, plan: &ActionPlan, report: &mut SyncReport) {
        let generator = IndexGenerator::new(self.source);
        let total = plan.indexes_to_create.len() + plan.indexes_to_update.len();
        let pending = plan
            .indexes_to_create
            .iter()
            .map(|path| (path, true))
            .chain(plan.indexes_to_update.iter().map(|path| (path, false)));

        for (i, (path, is_new)) in pending.enumerate() {
            self.progress.report("Generating indexes", i + 1, total);
            let verb = if is_new { "create" } else { "update" };
            if self.should_apply(report, format!("{verb} index {path}")) {
                let content = generator.render(path);
                if let Err(e) = io::write_text(&self.absolute(path), &content) {
                    report.record_failure(failure(Category::Index, Some(path), None, e));
                    continue;
                }
                report.record_action(format!("Wrote index {path}"));
            }
            if is_new {
                report.indexes.created += 1;
            } else {
                report.indexes.updated += 1;
            }
        }
    }
}

fn failure(
    category: Category,
    path: Option<&NormalizedPath>,
    note_id: Option<NoteId>,
    error: impl ToString,
) -> ItemFailure {
    ItemFailure {
        category,
        path: path.cloned(),
        note_id,
        message: error.to_string(),
    }
}
