//! Target state: what the destination tree currently holds

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use deck_fs::constants::MARKDOWN_EXTENSION;
use deck_fs::{MirrorPath, NormalizedPath, content_hash, is_index_filename};
use walkdir::{DirEntry, WalkDir};

use crate::frontmatter;
use crate::model::NoteId;
use crate::progress::ProgressSink;
use crate::{Error, Result};

const PROGRESS_INTERVAL: usize = 100;
const PROGRESS_LABEL: &str = "Scanning destination";

/// A managed note file found in the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNoteFile {
    pub path: NormalizedPath,
    pub note_id: NoteId,
    /// Source timestamp recorded at the last write, if readable
    pub mod_time: Option<i64>,
    /// Advisory only; never drives an update
    pub content_hash: Option<String>,
}

/// Immutable snapshot of the destination tree, built once per pass.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub(crate) root: PathBuf,
    pub(crate) folders: BTreeSet<NormalizedPath>,
    pub(crate) notes: BTreeMap<NormalizedPath, TargetNoteFile>,
    /// Index document path to the hash of its current content
    pub(crate) index_documents: BTreeMap<NormalizedPath, String>,
    /// File names directly inside the assets folder
    pub(crate) assets: BTreeSet<String>,
    pub(crate) unmanaged: BTreeSet<NormalizedPath>,
}

impl TargetState {
    /// Canonical absolute destination root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folders(&self) -> &BTreeSet<NormalizedPath> {
        &self.folders
    }

    /// Identity-bearing note files keyed by path.
    pub fn notes(&self) -> &BTreeMap<NormalizedPath, TargetNoteFile> {
        &self.notes
    }

    pub fn index_documents(&self) -> &BTreeMap<NormalizedPath, String> {
        &self.index_documents
    }

    pub fn assets(&self) -> &BTreeSet<String> {
        &self.assets
    }

    /// Markdown files without a parseable identity block. Never touched.
    pub fn unmanaged(&self) -> &BTreeSet<NormalizedPath> {
        &self.unmanaged
    }
}

/// Walks the destination root and classifies every entry.
#[derive(Debug, Clone)]
pub struct TargetScanner {
    root: PathBuf,
    assets_folder: String,
}

impl TargetScanner {
    pub fn new(root: impl Into<PathBuf>, assets_folder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            assets_folder: assets_folder.into(),
        }
    }

    /// Scan the destination.
    ///
    /// An unreachable root or a failed directory walk is fatal. A file that
    /// cannot be read is logged and left out.
    pub fn scan(&self, progress: &dyn ProgressSink) -> Result<TargetState> {
        let root = self.check_root()?;
        let mut state = TargetState {
            root: root.clone(),
            ..TargetState::default()
        };

        let assets_folder = self.assets_folder.as_str();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e, assets_folder));

        let mut scanned = 0;
        for entry in walker {
            let entry = entry.map_err(|e| Error::Scan {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
                message: e.to_string(),
            })?;
            let relative = entry.path().strip_prefix(&root).map_err(|e| Error::Scan {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
            })?;
            let path = NormalizedPath::new(relative);

            scanned += 1;
            if scanned % PROGRESS_INTERVAL == 0 {
                progress.report(PROGRESS_LABEL, scanned, 0);
            }

            if entry.file_type().is_dir() {
                if !self.is_assets_dir(&path) {
                    state.folders.insert(path);
                }
                continue;
            }
            self.classify_file(&mut state, entry.path(), path);
        }
        progress.report(PROGRESS_LABEL, scanned, scanned);

        tracing::info!(
            folders = state.folders.len(),
            notes = state.notes.len(),
            indexes = state.index_documents.len(),
            assets = state.assets.len(),
            unmanaged = state.unmanaged.len(),
            "Scanned destination"
        );
        Ok(state)
    }

    fn check_root(&self) -> Result<PathBuf> {
        let unreachable = |reason: String| Error::DestinationUnreachable {
            path: self.root.clone(),
            reason,
        };
        let metadata = std::fs::metadata(&self.root).map_err(|e| unreachable(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(unreachable("not a directory".to_string()));
        }
        dunce::canonicalize(&self.root).map_err(|e| unreachable(e.to_string()))
    }

    fn is_assets_dir(&self, path: &NormalizedPath) -> bool {
        path.depth() == 1 && path.as_str() == self.assets_folder
    }

    fn classify_file(&self, state: &mut TargetState, absolute: &Path, path: NormalizedPath) {
        let Some(name) = path.file_name().map(str::to_string) else {
            return;
        };

        if path.parent().is_some_and(|parent| self.is_assets_dir(&parent)) {
            state.assets.insert(name);
            return;
        }

        if is_index_filename(&name) {
            // An unreadable index gets an empty hash so it is regenerated.
            let hash = match deck_fs::io::read_text(absolute) {
                Ok(content) => content_hash(&content),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "Failed to read index document");
                    String::new()
                }
            };
            state.index_documents.insert(path, hash);
            return;
        }

        if path.extension() != Some(MARKDOWN_EXTENSION) {
            return;
        }

        let content = match deck_fs::io::read_text(absolute) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(%path, error = %e, "Failed to read note file");
                state.unmanaged.insert(path);
                return;
            }
        };
        match frontmatter::parse_identity(&content) {
            Some(identity) => {
                state.notes.insert(
                    path.clone(),
                    TargetNoteFile {
                        path,
                        note_id: identity.note_id,
                        mod_time: identity.mod_time,
                        content_hash: identity.content_hash,
                    },
                );
            }
            None => {
                tracing::debug!(%path, "Markdown file has no identity block");
                state.unmanaged.insert(path);
            }
        }
    }
}

/// Metadata folders anywhere, and folders nested inside the top-level assets folder.
fn is_excluded_dir(entry: &DirEntry, assets_folder: &str) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if MirrorPath::is_metadata_dir(&name) {
        return true;
    }
    entry.depth() == 2
        && entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|parent| parent == assets_folder)
}
