//! Note-centric records shared by the source state, the diff engine and the executor

use std::collections::{BTreeMap, BTreeSet};

use deck_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::text;

/// Stable numeric identity assigned to a note by the source collection.
pub type NoteId = i64;
/// Identity of a card (one note has one or more cards).
pub type CardId = i64;
/// Identity of a deck in the source collection.
pub type DeckId = i64;
/// Identity of a note type in the source collection.
pub type NoteTypeId = i64;

/// Closed set of note-type capabilities.
///
/// Each kind decides which field names a note's file, which field labels it in
/// its deck index, and how the fallback renderer lays out its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Fill-in-the-blank notes with `{{c1::...}}` deletions
    Cloze,
    /// Front/back prompt notes
    Basic,
    /// Anything else; falls back to field order
    Other,
}

/// Built-in classification tags, checked in order.
const KIND_TAGS: &[(&str, NoteKind)] = &[("Cloze", NoteKind::Cloze), ("Basic", NoteKind::Basic)];

impl NoteKind {
    /// Classify a note-type name using the built-in tags.
    pub fn classify(type_name: &str) -> Self {
        KIND_TAGS
            .iter()
            .find(|(tag, _)| type_name.contains(tag))
            .map(|(_, kind)| *kind)
            .unwrap_or(NoteKind::Other)
    }

    /// Classify with user overrides taking precedence over the built-in tags.
    pub fn resolve(type_name: &str, overrides: &BTreeMap<String, NoteKind>) -> Self {
        overrides
            .get(type_name)
            .copied()
            .unwrap_or_else(|| Self::classify(type_name))
    }

    /// Raw text the note's file name is derived from.
    pub fn filename_source(self, fields: &FieldMap) -> String {
        match self {
            NoteKind::Cloze => {
                if let Some(title) = fields.get_ignore_case("title").filter(|v| !v.trim().is_empty()) {
                    return title.to_string();
                }
                fields
                    .get_ignore_case("text")
                    .or_else(|| fields.get_ignore_case("content"))
                    .map(text::reduce_cloze)
                    .unwrap_or_default()
            }
            NoteKind::Basic => fields
                .get_ignore_case("front")
                .unwrap_or_default()
                .to_string(),
            NoteKind::Other => fields.first_non_empty().unwrap_or_default().to_string(),
        }
    }

    /// Raw text used as the note's link label in its deck index.
    pub fn label_source(self, fields: &FieldMap) -> &str {
        match self {
            NoteKind::Cloze => ["Title", "Text", "Content"]
                .iter()
                .filter_map(|name| fields.get(name))
                .find(|value| !value.is_empty())
                .unwrap_or_default(),
            NoteKind::Basic => fields.get("Front").unwrap_or_default(),
            NoteKind::Other => fields.iter().next().map(|(_, v)| v).unwrap_or_default(),
        }
    }
}

/// Ordered field map of a note: name to raw markup, in note-type order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair field names with values; missing trailing values read as empty.
    pub fn from_parts(names: &[String], values: &[String]) -> Self {
        Self(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), values.get(i).cloned().unwrap_or_default()))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn first_non_empty(&self) -> Option<&str> {
        self.0
            .iter()
            .map(|(_, v)| v.as_str())
            .find(|v| !v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One source note, as it should appear in the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: NoteId,
    /// Source modification timestamp (seconds)
    pub mod_time: i64,
    pub note_type: String,
    pub kind: NoteKind,
    pub fields: FieldMap,
    /// Deterministic file name: sanitized display text + identity + `.md`
    pub filename: String,
    /// Media files referenced by the note's fields
    pub media: BTreeSet<String>,
    pub card_ids: Vec<CardId>,
}

/// A deck mirrored as a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckNode {
    /// Sanitized slash-joined path; the synthetic root has the empty path
    pub path: NormalizedPath,
    /// Display name (the unsanitized last segment of the deck name)
    pub name: String,
    pub parent: Option<NormalizedPath>,
    pub children: BTreeSet<NormalizedPath>,
    /// Notes owned directly by this deck (not by its sub-decks)
    pub notes: BTreeMap<NoteId, NoteRecord>,
    pub index_filename: String,
    /// Source deck id; `None` for the root and for implied parent decks
    pub deck_id: Option<DeckId>,
}

impl DeckNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Destination-relative path of this deck's index document.
    pub fn index_path(&self) -> NormalizedPath {
        self.path.join(&self.index_filename)
    }

    /// Destination-relative path a note owned by this deck should live at.
    pub fn note_path(&self, note: &NoteRecord) -> NormalizedPath {
        self.path.join(&note.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        let mut map = FieldMap::new();
        for (name, value) in pairs {
            map.insert(*name, *value);
        }
        map
    }

    #[rstest]
    #[case("Cloze", NoteKind::Cloze)]
    #[case("Cloze (Custom)", NoteKind::Cloze)]
    #[case("Basic", NoteKind::Basic)]
    #[case("Basic (and reversed card)", NoteKind::Basic)]
    #[case("Vocabulary", NoteKind::Other)]
    fn classifies_note_types(#[case] name: &str, #[case] expected: NoteKind) {
        assert_eq!(NoteKind::classify(name), expected);
    }

    #[test]
    fn overrides_win_over_tags() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Basic Cloze Hybrid".to_string(), NoteKind::Basic);
        assert_eq!(NoteKind::resolve("Basic Cloze Hybrid", &overrides), NoteKind::Basic);
        assert_eq!(NoteKind::resolve("Cloze", &overrides), NoteKind::Cloze);
    }

    #[test]
    fn cloze_prefers_title_then_reduced_text() {
        let titled = fields(&[("Title", "Verbs"), ("Text", "{{c1::ser}}")]);
        assert_eq!(NoteKind::Cloze.filename_source(&titled), "Verbs");

        let untitled = fields(&[("Title", "  "), ("Text", "Yo {{c1::soy::ser}} feliz")]);
        assert_eq!(NoteKind::Cloze.filename_source(&untitled), "Yo soy feliz");
    }

    #[test]
    fn other_uses_first_non_empty_field() {
        let map = fields(&[("Word", ""), ("Meaning", "dog")]);
        assert_eq!(NoteKind::Other.filename_source(&map), "dog");
        assert_eq!(NoteKind::Other.label_source(&map), "");
    }

    #[test]
    fn field_map_pads_missing_values() {
        let names = vec!["Front".to_string(), "Back".to_string()];
        let map = FieldMap::from_parts(&names, &["Hola".to_string()]);
        assert_eq!(map.get("Front"), Some("Hola"));
        assert_eq!(map.get("Back"), Some(""));
    }
}
