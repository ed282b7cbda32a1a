//! Identity metadata block at the top of every managed note file
//!
//! ```markdown
//! ---
//! anki_note_id: 1
//! anki_note_mod: 1700000000
//! content_hash: 3f2a...
//! ---
//!
//! <rendered body>
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::Result;
use crate::model::NoteId;

const DELIMITER: &str = "---";

/// Metadata written at the top of a managed note file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFrontmatter {
    pub anki_note_id: NoteId,
    pub anki_note_mod: i64,
    pub content_hash: String,
}

/// Identity fields recovered from an existing note file.
///
/// Only the identity is required; a malformed timestamp or hash reads as
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub note_id: NoteId,
    pub mod_time: Option<i64>,
    pub content_hash: Option<String>,
}

/// Split a document into its leading YAML block and the remaining content.
///
/// Returns `(None, raw)` when the document does not open with a complete
/// `---` delimited block.
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let Some(after_opening) = raw.strip_prefix(DELIMITER) else {
        return (None, raw);
    };

    let block_start = if let Some(rest) = after_opening.strip_prefix('\n') {
        rest
    } else if let Some(rest) = after_opening.strip_prefix("\r\n") {
        rest
    } else {
        return (None, raw);
    };

    let Some(close_pos) = find_closing_delimiter(block_start) else {
        return (None, raw);
    };

    let yaml = &block_start[..close_pos];
    let after_close = &block_start[close_pos + DELIMITER.len()..];
    let content = after_close
        .strip_prefix("\r\n")
        .or_else(|| after_close.strip_prefix('\n'))
        .unwrap_or(after_close);

    (Some(yaml), content)
}

/// Byte offset of the closing delimiter, which must sit alone on its line.
fn find_closing_delimiter(s: &str) -> Option<usize> {
    let mut pos = 0;
    for line in s.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some(pos);
        }
        pos += line.len();
    }
    None
}

/// Parse the identity block of a note file.
///
/// Returns `None` when the block is absent, is not valid YAML, or lacks an
/// integer `anki_note_id`.
pub fn parse_identity(raw: &str) -> Option<ParsedIdentity> {
    let (yaml, _) = split_frontmatter(raw);
    let mapping = match serde_yaml::from_str::<Value>(yaml?) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(_) => return None,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable frontmatter");
            return None;
        }
    };

    let note_id = mapping.get("anki_note_id").and_then(Value::as_i64)?;
    let mod_time = mapping.get("anki_note_mod").and_then(Value::as_i64);
    let content_hash = mapping
        .get("content_hash")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ParsedIdentity {
        note_id,
        mod_time,
        content_hash,
    })
}

/// Assemble a managed note file from its metadata and rendered body.
pub fn render_note_file(meta: &NoteFrontmatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(meta)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rendered_file_parses_back() {
        let meta = NoteFrontmatter {
            anki_note_id: 42,
            anki_note_mod: 1_700_000_000,
            content_hash: "00ff".to_string(),
        };
        let file = render_note_file(&meta, "## Front\n\nHola").unwrap();

        assert!(file.starts_with("---\nanki_note_id: 42\n"));
        assert!(file.ends_with("---\n\n## Front\n\nHola"));
        assert_eq!(
            parse_identity(&file),
            Some(ParsedIdentity {
                note_id: 42,
                mod_time: Some(1_700_000_000),
                content_hash: Some("00ff".to_string()),
            })
        );
    }

    #[test]
    fn numeric_looking_hash_stays_a_string() {
        let meta = NoteFrontmatter {
            anki_note_id: 1,
            anki_note_mod: 2,
            content_hash: "1234".to_string(),
        };
        let file = render_note_file(&meta, "").unwrap();
        assert_eq!(
            parse_identity(&file).unwrap().content_hash.as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn malformed_timestamp_reads_as_unknown() {
        let raw = "---\nanki_note_id: 7\nanki_note_mod: yesterday\n---\n\nbody";
        let parsed = parse_identity(raw).unwrap();
        assert_eq!(parsed.note_id, 7);
        assert_eq!(parsed.mod_time, None);
        assert_eq!(parsed.content_hash, None);
    }

    #[test]
    fn missing_or_invalid_identity_is_rejected() {
        assert_eq!(parse_identity("# Just a heading"), None);
        assert_eq!(parse_identity("---\ntitle: x\n---\n"), None);
        assert_eq!(parse_identity("---\nanki_note_id: abc\n---\n"), None);
        assert_eq!(parse_identity("---\nanki_note_id: 1\n"), None);
        assert_eq!(parse_identity("---\n: : :\n---\n"), None);
    }

    #[test]
    fn split_handles_crlf() {
        let (yaml, content) = split_frontmatter("---\r\na: 1\r\n---\r\nbody");
        assert_eq!(yaml, Some("a: 1\r\n"));
        assert_eq!(content, "body");
    }
}
