//! Filename sanitization for deck folders and note files

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MARKDOWN_EXTENSION;

/// Characters that are invalid in file names on at least one major platform.
static INVALID_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());

static REPEATED_REPLACEMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

const REPLACEMENT_CHAR: &str = "_";

/// Longest sanitized name, in characters.
pub const MAX_FILENAME_LENGTH: usize = 100;

/// Name used when the input is empty.
pub const UNTITLED_NAME: &str = "Untitled Anki Note";

/// Name used when sanitization removes everything.
pub const FALLBACK_NAME: &str = "anki_note";

/// Leading dots would hide the entry; trailing dots and spaces are invalid on Windows.
fn trim_name(name: &str) -> &str {
    name.trim_start_matches(|c: char| c == '.' || c == '_' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '.' || c == '_' || c.is_whitespace())
}

/// Make `name` safe to use as a single path segment.
///
/// Invalid characters become `_`, runs of `_` collapse, leading and trailing dots and
/// whitespace are removed and the result is capped at
/// [`MAX_FILENAME_LENGTH`] characters. The function is pure: the same input
/// always yields the same segment.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { UNTITLED_NAME } else { name };

    let replaced = INVALID_FILENAME_CHARS.replace_all(name, REPLACEMENT_CHAR);
    let collapsed = REPEATED_REPLACEMENT.replace_all(&replaced, REPLACEMENT_CHAR);
    let mut sanitized = trim_name(&collapsed).to_string();

    if sanitized.chars().count() > MAX_FILENAME_LENGTH {
        let truncated: String = sanitized.chars().take(MAX_FILENAME_LENGTH).collect();
        sanitized = trim_name(&truncated).to_string();
    }

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// Target file name of a note: sanitized display text plus the note identity.
///
/// The identity suffix keeps names unique when two notes share display text.
pub fn note_filename(display_text: &str, note_id: i64) -> String {
    format!(
        "{}_{}.{}",
        sanitize_filename(display_text),
        note_id,
        MARKDOWN_EXTENSION
    )
}
