//! [`CollectionFixture`]: builds collection exports in the snapshot format.

use std::fs;
use std::path::Path;

use serde::Serialize;

/// Note type id of the built-in `Basic` type (fields `Front`, `Back`).
pub const BASIC_TYPE: i64 = 1;
/// Note type id of the built-in `Cloze` type (fields `Text`, `Back Extra`).
pub const CLOZE_TYPE: i64 = 2;

#[derive(Debug, Clone, Serialize)]
struct Deck {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct NoteType {
    id: i64,
    name: String,
    fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Note {
    id: i64,
    #[serde(rename = "mod")]
    mod_time: i64,
    note_type: i64,
    fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Card {
    id: i64,
    note: i64,
    deck: i64,
}

/// Mutable collection export, re-serializable between sync passes.
///
/// Each note gets one card with id `note_id * 10`.
///
/// ```rust,no_run
/// use deck_test_utils::CollectionFixture;
///
/// let mut fixture = CollectionFixture::new();
/// fixture.deck(1, "Languages::Spanish").basic(1, 1, "Hola", "Hello", 100);
/// let json = fixture.to_json();
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CollectionFixture {
    decks: Vec<Deck>,
    note_types: Vec<NoteType>,
    notes: Vec<Note>,
    cards: Vec<Card>,
}

impl Default for CollectionFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionFixture {
    /// Empty collection with the `Basic` and `Cloze` note types.
    pub fn new() -> Self {
        Self {
            decks: Vec::new(),
            note_types: vec![
                NoteType {
                    id: BASIC_TYPE,
                    name: "Basic".into(),
                    fields: vec!["Front".into(), "Back".into()],
                },
                NoteType {
                    id: CLOZE_TYPE,
                    name: "Cloze".into(),
                    fields: vec!["Text".into(), "Back Extra".into()],
                },
            ],
            notes: Vec::new(),
            cards: Vec::new(),
        }
    }

    pub fn deck(&mut self, id: i64, name: &str) -> &mut Self {
        self.decks.push(Deck {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn note_type(&mut self, id: i64, name: &str, fields: &[&str]) -> &mut Self {
        self.note_types.push(NoteType {
            id,
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Add a note with one card in `deck`.
    pub fn note(&mut self, id: i64, deck: i64, note_type: i64, fields: &[&str], mod_time: i64) -> &mut Self {
        self.notes.push(Note {
            id,
            mod_time,
            note_type,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self.cards.push(Card {
            id: id * 10,
            note: id,
            deck,
        });
        self
    }

    pub fn basic(&mut self, id: i64, deck: i64, front: &str, back: &str, mod_time: i64) -> &mut Self {
        self.note(id, deck, BASIC_TYPE, &[front, back], mod_time)
    }

    pub fn cloze(&mut self, id: i64, deck: i64, text: &str, mod_time: i64) -> &mut Self {
        self.note(id, deck, CLOZE_TYPE, &[text, ""], mod_time)
    }

    /// Add a note that has no cards.
    pub fn cardless_note(&mut self, id: i64, front: &str) -> &mut Self {
        self.notes.push(Note {
            id,
            mod_time: 0,
            note_type: BASIC_TYPE,
            fields: vec![front.to_string(), String::new()],
        });
        self
    }

    /// Replace a note's fields and bump its modification time.
    pub fn edit(&mut self, id: i64, fields: &[&str], mod_time: i64) -> &mut Self {
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.fields = fields.iter().map(|f| f.to_string()).collect();
            note.mod_time = mod_time;
        }
        self
    }

    /// Reassign every card of a note to another deck.
    pub fn move_note(&mut self, id: i64, deck: i64) -> &mut Self {
        for card in self.cards.iter_mut().filter(|c| c.note == id) {
            card.deck = deck;
        }
        self
    }

    pub fn remove_note(&mut self, id: i64) -> &mut Self {
        self.notes.retain(|n| n.id != id);
        self.cards.retain(|c| c.note != id);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap()
    }

    pub fn write_to(&self, path: &Path) {
        fs::write(path, self.to_json()).unwrap();
    }
}
