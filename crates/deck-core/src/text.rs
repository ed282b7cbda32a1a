//! Markup cleanup helpers shared by file naming, index labels and the fallback renderer

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").unwrap());

/// Cloze deletion: `{{c<n>::answer}}` or `{{c<n>::answer::hint}}`.
pub static CLOZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{c(\d+)::(.*?)(?:::(.*?))?\}\}").unwrap());

/// Longest index link label, in characters, before truncation.
pub const MAX_LABEL_LENGTH: usize = 80;

/// Label used when a note has no usable display text.
pub const UNTITLED_LABEL: &str = "Untitled Note";

/// Decode HTML character references, numeric ones and the full HTML5 named set.
pub fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

/// Replace every tag with `replacement`.
pub fn strip_tags(input: &str, replacement: &str) -> String {
    TAG.replace_all(input, replacement).into_owned()
}

/// Turn `<br>` variants into `replacement`.
pub fn replace_line_breaks(input: &str, replacement: &str) -> String {
    LINE_BREAK.replace_all(input, replacement).into_owned()
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").trim().to_string()
}

/// Reduce cloze deletions to their answers.
pub fn reduce_cloze(input: &str) -> String {
    CLOZE.replace_all(input, "$2").into_owned()
}

/// Readable single-line text of a markup field, used to derive file names.
pub fn display_text(markup: &str) -> String {
    let without_tags = strip_tags(markup, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// Truncate to `max` characters, appending an ellipsis when shortened.
pub fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let mut truncated: String = input.chars().take(max).collect();
    truncated.push_str("...");
    truncated
}

/// Link label for a note in its deck index.
pub fn link_label(markup: &str) -> String {
    if markup.is_empty() {
        return UNTITLED_LABEL.to_string();
    }
    let text = replace_line_breaks(markup, " ");
    let text = strip_tags(&text, "");
    let text = text.replace("==", "").replace("**", "");
    let text = MARKDOWN_IMAGE.replace_all(&text, "");
    let text = MARKDOWN_LINK.replace_all(&text, "$1");
    let text = collapse_whitespace(&decode_entities(&text));
    let text = truncate_chars(&text, MAX_LABEL_LENGTH);
    if text.is_empty() {
        UNTITLED_LABEL.to_string()
    } else {
        text
    }
}
