//! Source state: the deck tree and note records the destination should mirror

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use deck_fs::{MirrorPath, NormalizedPath, deck_index_filename, note_filename, sanitize_filename};
use serde::Serialize;

use crate::Result;
use crate::collection::{Collection, DECK_NAME_SEPARATOR};
use crate::media;
use crate::model::{DeckId, DeckNode, FieldMap, NoteId, NoteKind, NoteRecord};
use crate::progress::ProgressSink;
use crate::text;

/// Display name of the synthetic root deck.
pub const ROOT_DECK_NAME: &str = "Anki Collection";

const PROGRESS_INTERVAL: usize = 50;
const PROGRESS_LABEL: &str = "Building source state";

/// Why a note was left out of the source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoNoteType,
    NoCards,
    NoDeck,
    EmptyFilename,
    Unreadable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoNoteType => "note type not found",
            Self::NoCards => "note has no cards",
            Self::NoDeck => "deck could not be resolved",
            Self::EmptyFilename => "derived filename is empty",
            Self::Unreadable => "note could not be read",
        };
        f.write_str(reason)
    }
}

/// A note left out of the source state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedNote {
    pub id: NoteId,
    pub reason: SkipReason,
}

/// Immutable snapshot of the source collection, built once per pass.
#[derive(Debug, Clone)]
pub struct SourceState {
    decks: BTreeMap<NormalizedPath, DeckNode>,
    note_decks: BTreeMap<NoteId, NormalizedPath>,
    skipped: Vec<SkippedNote>,
}

impl SourceState {
    /// The synthetic root deck.
    pub fn root(&self) -> &DeckNode {
        &self.decks[&NormalizedPath::root()]
    }

    pub fn deck(&self, path: &NormalizedPath) -> Option<&DeckNode> {
        self.decks.get(path)
    }

    /// All decks in path order, root first.
    pub fn decks(&self) -> impl Iterator<Item = &DeckNode> {
        self.decks.values()
    }

    /// A note together with the deck owning it.
    pub fn note(&self, id: NoteId) -> Option<(&DeckNode, &NoteRecord)> {
        let deck = self.decks.get(self.note_decks.get(&id)?)?;
        Some((deck, deck.notes.get(&id)?))
    }

    /// All notes with their owning decks, ordered by deck path then identity.
    pub fn notes(&self) -> impl Iterator<Item = (&DeckNode, &NoteRecord)> {
        self.decks
            .values()
            .flat_map(|deck| deck.notes.values().map(move |note| (deck, note)))
    }

    pub fn note_count(&self) -> usize {
        self.note_decks.len()
    }

    /// Union of the media referenced by every note.
    pub fn referenced_media(&self) -> BTreeSet<String> {
        self.notes()
            .flat_map(|(_, note)| note.media.iter().cloned())
            .collect()
    }

    pub fn skipped(&self) -> &[SkippedNote] {
        &self.skipped
    }
}

/// Builds a [`SourceState`] from a [`Collection`].
pub struct SourceBuilder<'a> {
    collection: &'a dyn Collection,
    note_kinds: BTreeMap<String, NoteKind>,
}

impl<'a> SourceBuilder<'a> {
    pub fn new(collection: &'a dyn Collection) -> Self {
        Self {
            collection,
            note_kinds: BTreeMap::new(),
        }
    }

    /// Note-type classifications overriding the built-in tags.
    pub fn with_note_kinds(mut self, note_kinds: BTreeMap<String, NoteKind>) -> Self {
        self.note_kinds = note_kinds;
        self
    }

    /// Read the whole collection.
    ///
    /// Failing to list decks or notes is fatal; a note that cannot be placed
    /// is recorded in [`SourceState::skipped`] instead.
    pub fn build(&self, progress: &dyn ProgressSink) -> Result<SourceState> {
        let mut decks = BTreeMap::new();
        decks.insert(NormalizedPath::root(), root_deck());
        let deck_paths = self.build_decks(&mut decks)?;

        let mut note_decks = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut seen = BTreeSet::new();

        let note_ids = self.collection.note_ids()?;
        let total = note_ids.len();
        for (i, id) in note_ids.into_iter().enumerate() {
            let processed = i + 1;
            if processed % PROGRESS_INTERVAL == 0 || processed == total {
                progress.report(PROGRESS_LABEL, processed, total);
            }
            if !seen.insert(id) {
                continue;
            }

            match self.build_note(id, &deck_paths) {
                Ok((deck_path, record)) => {
                    if let Some(deck) = decks.get_mut(&deck_path) {
                        deck.notes.insert(id, record);
                        note_decks.insert(id, deck_path);
                    }
                }
                Err(reason) => {
                    tracing::debug!(note_id = id, %reason, "Skipping note");
                    skipped.push(SkippedNote { id, reason });
                }
            }
        }

        tracing::info!(
            decks = decks.len() - 1,
            notes = note_decks.len(),
            skipped = skipped.len(),
            "Built source state"
        );

        Ok(SourceState {
            decks,
            note_decks,
            skipped,
        })
    }

    /// Insert a node for every deck and every implied ancestor, returning the
    /// path of each source deck id.
    fn build_decks(
        &self,
        decks: &mut BTreeMap<NormalizedPath, DeckNode>,
    ) -> Result<HashMap<DeckId, NormalizedPath>> {
        let mut entries = self.collection.decks()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut deck_paths = HashMap::new();
        for entry in entries {
            let parts: Vec<&str> = entry.name.split(DECK_NAME_SEPARATOR).collect();
            let mut parent = NormalizedPath::root();

            for (depth, part) in parts.iter().enumerate() {
                let segment = sanitize_filename(part);
                let path = parent.join(&segment);

                if !decks.contains_key(&path) {
                    decks.insert(
                        path.clone(),
                        DeckNode {
                            path: path.clone(),
                            name: part.to_string(),
                            parent: Some(parent.clone()),
                            children: BTreeSet::new(),
                            notes: BTreeMap::new(),
                            index_filename: deck_index_filename(&segment),
                            deck_id: None,
                        },
                    );
                    if let Some(parent_node) = decks.get_mut(&parent) {
                        parent_node.children.insert(path.clone());
                    }
                }

                if depth + 1 == parts.len() {
                    if let Some(node) = decks.get_mut(&path) {
                        if node.deck_id.is_some() {
                            tracing::warn!(deck = %entry.name, %path, "Deck name collides with another deck after sanitizing");
                        } else {
                            node.deck_id = Some(entry.id);
                        }
                    }
                    deck_paths.insert(entry.id, path.clone());
                }
                parent = path;
            }
        }

        Ok(deck_paths)
    }

    fn build_note(
        &self,
        id: NoteId,
        deck_paths: &HashMap<DeckId, NormalizedPath>,
    ) -> std::result::Result<(NormalizedPath, NoteRecord), SkipReason> {
        let entry = self.collection.note(id).map_err(|e| {
            tracing::warn!(note_id = id, error = %e, "Failed to read note");
            SkipReason::Unreadable
        })?;
        let note_type = self
            .collection
            .note_type(entry.note_type)
            .ok_or(SkipReason::NoNoteType)?;
        let first_card = *entry.cards.first().ok_or(SkipReason::NoCards)?;
        let deck_path = self
            .collection
            .card_deck(first_card)
            .and_then(|deck_id| deck_paths.get(&deck_id))
            .ok_or(SkipReason::NoDeck)?
            .clone();

        let fields = FieldMap::from_parts(&note_type.fields, &entry.fields);
        let kind = NoteKind::resolve(&note_type.name, &self.note_kinds);
        let display = text::display_text(&kind.filename_source(&fields));
        let filename = note_filename(&display, id);
        if filename.is_empty() {
            return Err(SkipReason::EmptyFilename);
        }

        let record = NoteRecord {
            id,
            mod_time: entry.mod_time,
            note_type: note_type.name,
            kind,
            media: media::referenced_media(&fields),
            fields,
            filename,
            card_ids: entry.cards,
        };
        Ok((deck_path, record))
    }
}

fn root_deck() -> DeckNode {
    DeckNode {
        path: NormalizedPath::root(),
        name: ROOT_DECK_NAME.to_string(),
        parent: None,
        children: BTreeSet::new(),
        notes: BTreeMap::new(),
        index_filename: MirrorPath::RootIndex.as_str().to_string(),
        deck_id: None,
    }
}
