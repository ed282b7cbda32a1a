//! Read-only interface to the source database of decks, note types, notes and cards

use std::collections::HashMap;
use std::path::Path;

use deck_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::model::{CardId, DeckId, NoteId, NoteTypeId};
use crate::{Error, Result};

/// Separator between levels of a hierarchical deck name.
pub const DECK_NAME_SEPARATOR: &str = "::";

/// A deck as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub id: DeckId,
    /// Hierarchical name, e.g. `Languages::Spanish`
    pub name: String,
}

/// A note type definition with its ordered field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTypeEntry {
    pub id: NoteTypeId,
    pub name: String,
    pub fields: Vec<String>,
}

/// A note as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub id: NoteId,
    #[serde(rename = "mod")]
    pub mod_time: i64,
    pub note_type: NoteTypeId,
    /// Field values, positionally aligned with the note type's field names
    pub fields: Vec<String>,
    /// Card ids in card order; filled from the card table when loading a snapshot
    #[serde(default)]
    pub cards: Vec<CardId>,
}

/// A card and the deck it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub id: CardId,
    pub note: NoteId,
    pub deck: DeckId,
}

/// Read-only access to the source database.
///
/// Errors from `decks` and `note_ids` abort the pass. Errors from `note`
/// only skip the affected note.
pub trait Collection {
    fn decks(&self) -> Result<Vec<DeckEntry>>;

    fn note_ids(&self) -> Result<Vec<NoteId>>;

    fn note(&self, id: NoteId) -> Result<NoteEntry>;

    fn note_type(&self, id: NoteTypeId) -> Option<NoteTypeEntry>;

    /// Deck assignment of a card, if the card exists.
    fn card_deck(&self, card: CardId) -> Option<DeckId>;
}

/// Serialized form of a collection export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub decks: Vec<DeckEntry>,
    #[serde(default)]
    pub note_types: Vec<NoteTypeEntry>,
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
    #[serde(default)]
    pub cards: Vec<CardEntry>,
}

/// In-memory collection, typically loaded from a JSON/TOML/YAML export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "SnapshotData")]
pub struct CollectionSnapshot {
    decks: Vec<DeckEntry>,
    note_types: HashMap<NoteTypeId, NoteTypeEntry>,
    notes: Vec<NoteEntry>,
    note_positions: HashMap<NoteId, usize>,
    card_decks: HashMap<CardId, DeckId>,
}

impl From<SnapshotData> for CollectionSnapshot {
    fn from(data: SnapshotData) -> Self {
        let mut notes = data.notes;
        let note_positions: HashMap<NoteId, usize> = notes
            .iter()
            .enumerate()
            .map(|(i, note)| (note.id, i))
            .collect();

        for card in &data.cards {
            if let Some(&pos) = note_positions.get(&card.note)
                && !notes[pos].cards.contains(&card.id)
            {
                notes[pos].cards.push(card.id);
            }
        }

        Self {
            decks: data.decks,
            note_types: data.note_types.into_iter().map(|t| (t.id, t)).collect(),
            notes,
            note_positions,
            card_decks: data.cards.iter().map(|c| (c.id, c.deck)).collect(),
        }
    }
}

impl CollectionSnapshot {
    /// Load an export, detecting the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let data: SnapshotData = ConfigStore::new().load(path).map_err(|e| {
            Error::collection(format!("failed to load collection export: {e}"))
        })?;
        tracing::debug!(
            ?path,
            decks = data.decks.len(),
            notes = data.notes.len(),
            cards = data.cards.len(),
            "Loaded collection export"
        );
        Ok(data.into())
    }
}

impl Collection for CollectionSnapshot {
    fn decks(&self) -> Result<Vec<DeckEntry>> {
        Ok(self.decks.clone())
    }

    fn note_ids(&self) -> Result<Vec<NoteId>> {
        Ok(self.notes.iter().map(|n| n.id).collect())
    }

    fn note(&self, id: NoteId) -> Result<NoteEntry> {
        self.note_positions
            .get(&id)
            .map(|&pos| self.notes[pos].clone())
            .ok_or_else(|| Error::collection(format!("note {id} not found")))
    }

    fn note_type(&self, id: NoteTypeId) -> Option<NoteTypeEntry> {
        self.note_types.get(&id).cloned()
    }

    fn card_deck(&self, card: CardId) -> Option<DeckId> {
        self.card_decks.get(&card).copied()
    }
}
