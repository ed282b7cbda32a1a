//! Reserved names of the mirrored destination layout.

use std::path::Path;

/// Extension of every generated markdown document.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Reserved entries of the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPath {
    /// Default folder holding copied media assets
    AssetsDir,
    /// The root index document
    RootIndex,
    /// Obsidian's vault metadata folder, never traversed
    ObsidianDir,
    /// Git metadata folder, never traversed
    GitDir,
}

impl MirrorPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetsDir => "assets",
            Self::RootIndex => "_Anki_Collection_Index.md",
            Self::ObsidianDir => ".obsidian",
            Self::GitDir => ".git",
        }
    }

    /// Folders the scanner never descends into.
    pub fn metadata_dirs() -> &'static [MirrorPath] {
        &[Self::ObsidianDir, Self::GitDir]
    }

    pub fn is_metadata_dir(name: &str) -> bool {
        Self::metadata_dirs().iter().any(|p| p.as_str() == name)
    }
}

impl AsRef<Path> for MirrorPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MirrorPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MirrorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const DECK_INDEX_PREFIX: &str = "_";
const DECK_INDEX_SUFFIX: &str = "_index.md";

/// File name of the index document for a deck with the given sanitized segment.
pub fn deck_index_filename(sanitized_segment: &str) -> String {
    format!("{DECK_INDEX_PREFIX}{sanitized_segment}{DECK_INDEX_SUFFIX}")
}

/// Whether a file name follows the root or deck index naming convention.
pub fn is_index_filename(name: &str) -> bool {
    name == MirrorPath::RootIndex.as_str()
        || (name.len() > DECK_INDEX_PREFIX.len() + DECK_INDEX_SUFFIX.len()
            && name.starts_with(DECK_INDEX_PREFIX)
            && name.ends_with(DECK_INDEX_SUFFIX))
}
