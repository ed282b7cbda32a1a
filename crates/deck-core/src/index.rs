//! Generated navigation documents
//!
//! The root index lists the whole deck tree as nested headings and links to
//! every deck index. A deck index links the notes its deck owns directly.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use deck_fs::{MirrorPath, NormalizedPath};
use regex::Regex;

use crate::model::DeckNode;
use crate::source::SourceState;
use crate::text;

const MAX_HEADING_LEVEL: usize = 6;
const NO_DECKS: &str = "- (No decks found)";
const NO_NOTES: &str = "- (No notes directly in this deck)";

static NUMBERED_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.").unwrap());

/// Renders index documents from a source state.
#[derive(Debug, Clone, Copy)]
pub struct IndexGenerator<'a> {
    source: &'a SourceState,
}

impl<'a> IndexGenerator<'a> {
    pub fn new(source: &'a SourceState) -> Self {
        Self { source }
    }

    /// The root index plus one index per deck that directly owns a note.
    pub fn expected(&self) -> BTreeSet<NormalizedPath> {
        self.source
            .decks()
            .filter(|deck| deck.is_root() || !deck.notes.is_empty())
            .map(DeckNode::index_path)
            .collect()
    }

    /// Content of the index document at `path`.
    pub fn render(&self, path: &NormalizedPath) -> String {
        if path.as_str() == MirrorPath::RootIndex.as_str() {
            return self.render_root();
        }
        let deck_path = path.parent().unwrap_or_default();
        match self.source.deck(&deck_path).filter(|deck| !deck.is_root()) {
            Some(deck) => render_deck(deck),
            None => render_orphan(path),
        }
    }

    fn render_root(&self) -> String {
        let root = self.source.root();
        let mut lines = vec![format!("# {}", root.name), String::new()];
        if root.children.is_empty() {
            lines.push(NO_DECKS.to_string());
        } else {
            for child in &root.children {
                self.render_tree(child, 1, &mut lines);
                lines.push(String::new());
            }
        }
        lines.join("\n")
    }

    fn render_tree(&self, path: &NormalizedPath, depth: usize, lines: &mut Vec<String>) {
        let Some(deck) = self.source.deck(path) else {
            return;
        };
        let level = (depth + 1).min(MAX_HEADING_LEVEL);
        lines.push(format!("{} {}", "#".repeat(level), deck.name));
        if !deck.notes.is_empty() {
            lines.push(format!("- [[{}|{} Index]]", deck.index_path(), deck.name));
        }
        for child in &deck.children {
            self.render_tree(child, depth + 1, lines);
        }
    }
}

fn render_deck(deck: &DeckNode) -> String {
    let mut lines = vec![
        format!("# Notes in Deck: {}", deck.name),
        "\n## Notes\n".to_string(),
    ];

    let mut links: Vec<(String, String)> = deck
        .notes
        .values()
        .map(|note| {
            let label = text::link_label(note.kind.label_source(&note.fields));
            let link = format!("- [[{}|{label}]]", deck.note_path(note));
            (label, link)
        })
        .collect();
    links.sort_by_key(|(label, _)| sort_key(label));

    if links.is_empty() {
        lines.push(NO_NOTES.to_string());
    } else {
        lines.extend(links.into_iter().map(|(_, link)| link));
    }
    lines.join("\n")
}

fn render_orphan(path: &NormalizedPath) -> String {
    format!(
        "# Orphaned Index: {path}\n\nThis index belongs to a deck that no longer exists in the collection."
    )
}

/// Labels starting with `<number>.` sort by that number; the rest follow in
/// their existing order.
fn sort_key(label: &str) -> u64 {
    NUMBERED_LABEL
        .captures(label)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(u64::MAX)
}
