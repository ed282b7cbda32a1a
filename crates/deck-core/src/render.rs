//! Rendering of note fields into a markdown body
//!
//! The executor treats the renderer as an opaque collaborator. When the
//! configured renderer fails for a note, the body falls back to
//! [`PlainTextRenderer`] output followed by [`DEGRADED_NOTICE`].

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{NoteId, NoteKind, NoteRecord};
use crate::text;

/// Appended under a horizontal rule to bodies produced by the fallback path.
pub const DEGRADED_NOTICE: &str =
    "*Note: rendered without the markup converter; formatting may be incomplete.*";

const SECTION_RULE: &str = "\n\n<hr/>\n\n";

static STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:span|font|mark)\b.*?>|</(?:span|font|mark)>").unwrap());
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:div|p|li)>").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Errors raised by a renderer for a single note
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Renderer unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Failed to render note {note_id}: {message}")]
    Failed { note_id: NoteId, message: String },
}

/// Turns a note's raw fields into the markdown body of its file.
pub trait NoteRenderer {
    fn render(&self, note: &NoteRecord) -> Result<String, RenderError>;
}

/// Tag-stripping renderer that never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl NoteRenderer for PlainTextRenderer {
    fn render(&self, note: &NoteRecord) -> Result<String, RenderError> {
        Ok(plain_body(note))
    }
}

/// Body used when the configured renderer fails.
pub fn degraded_body(note: &NoteRecord) -> String {
    format!("{}\n\n---\n{DEGRADED_NOTICE}", plain_body(note))
}

fn plain_body(note: &NoteRecord) -> String {
    let fields = &note.fields;
    match note.kind {
        NoteKind::Basic => {
            let front = convert(fields.get("Front").unwrap_or_default());
            let back = convert(fields.get("Back").unwrap_or_default());
            format!("## Front\n\n{front}{SECTION_RULE}## Back\n\n{back}")
        }
        NoteKind::Cloze => {
            let source = fields
                .get("Text")
                .filter(|v| !v.is_empty())
                .or_else(|| fields.get("Content"))
                .unwrap_or_default();
            convert(source)
        }
        NoteKind::Other => fields
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(name, value)| format!("## {name}\n\n{}", convert(value)))
            .collect::<Vec<_>>()
            .join(SECTION_RULE),
    }
}

/// Plain text of a markup fragment, keeping line structure.
fn plain(markup: &str) -> String {
    let text = text::replace_line_breaks(markup, "\n");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = text::strip_tags(&text, "");
    text::decode_entities(&text).trim().to_string()
}

/// Convert one field. Text before each cloze becomes a numbered heading and
/// the cloze itself renders as its answer, with the hint in parentheses.
fn convert(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let content = STYLE_TAG.replace_all(markup, "");

    let mut parts = Vec::new();
    let mut heading = 1;
    let mut last = 0;
    for caps in text::CLOZE.captures_iter(&content) {
        let Some(whole) = caps.get(0) else { continue };

        let pre = plain(&content[last..whole.start()]);
        if !pre.is_empty() {
            parts.push(format!("## {heading}. {pre}"));
            heading += 1;
        }

        let answer = plain(caps.get(2).map_or("", |m| m.as_str()));
        match caps.get(3).map(|m| plain(m.as_str())) {
            Some(hint) if !hint.is_empty() => parts.push(format!("{answer} (*{hint}*)")),
            _ => parts.push(answer),
        }
        last = whole.end();
    }

    let post = plain(&content[last..]);
    if !post.is_empty() {
        parts.push(post);
    }

    let joined = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
        .replace("==", "");
    EXCESS_NEWLINES
        .replace_all(joined.trim(), "\n\n")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldMap;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn note(kind: NoteKind, pairs: &[(&str, &str)]) -> NoteRecord {
        let mut fields = FieldMap::new();
        for (name, value) in pairs {
            fields.insert(*name, *value);
        }
        NoteRecord {
            id: 1,
            mod_time: 0,
            note_type: format!("{kind:?}"),
            kind,
            fields,
            filename: "note_1.md".to_string(),
            media: BTreeSet::new(),
            card_ids: vec![10],
        }
    }

    #[test]
    fn basic_has_front_and_back_sections() {
        let n = note(
            NoteKind::Basic,
            &[("Front", "<b>Hola</b>"), ("Back", "Hello<br>Hi &amp; hey")],
        );
        assert_eq!(
            PlainTextRenderer.render(&n).unwrap(),
            "## Front\n\nHola\n\n<hr/>\n\n## Back\n\nHello\nHi & hey"
        );
    }

    #[test]
    fn cloze_segments_become_numbered_headings() {
        let n = note(
            NoteKind::Cloze,
            &[(
                "Text",
                "Capital of France? {{c1::Paris}} Largest river? {{c2::Loire::longest}} End.",
            )],
        );
        assert_eq!(
            PlainTextRenderer.render(&n).unwrap(),
            "## 1. Capital of France?\n\nParis\n\n## 2. Largest river?\n\nLoire (*longest*)\n\nEnd."
        );
    }

    #[test]
    fn cloze_falls_back_to_content_field() {
        let n = note(NoteKind::Cloze, &[("Text", ""), ("Content", "{{c1::<span style=\"color:red\">x</span>}}")]);
        assert_eq!(PlainTextRenderer.render(&n).unwrap(), "x");
    }

    #[test]
    fn other_joins_non_empty_fields() {
        let n = note(NoteKind::Other, &[("Word", "perro"), ("Notes", " "), ("Meaning", "dog")]);
        assert_eq!(
            PlainTextRenderer.render(&n).unwrap(),
            "## Word\n\nperro\n\n<hr/>\n\n## Meaning\n\ndog"
        );
    }

    #[test]
    fn degraded_body_carries_notice() {
        let n = note(NoteKind::Basic, &[("Front", "a"), ("Back", "b")]);
        let body = degraded_body(&n);
        assert!(body.starts_with("## Front"));
        assert!(body.ends_with(DEGRADED_NOTICE));
    }
}
