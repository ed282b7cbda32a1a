//! [`TestVault`]: a scratch destination tree with a media folder beside it.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary layout used by sync tests:
///
/// ```text
/// <tmp>/vault/            destination root
/// <tmp>/media/            media store
/// <tmp>/collection.json   collection export
/// ```
pub struct TestVault {
    temp_dir: TempDir,
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVault {
    /// Create the temporary directory with empty `vault/` and `media/` folders.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("vault")).unwrap();
        fs::create_dir_all(temp_dir.path().join("media")).unwrap();
        Self { temp_dir }
    }

    /// Destination root.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("vault")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.temp_dir.path().join("media")
    }

    /// Where [`CollectionFixture::write_to`](crate::CollectionFixture::write_to) output usually goes.
    pub fn export_path(&self) -> PathBuf {
        self.temp_dir.path().join("collection.json")
    }

    /// Scratch path outside the vault.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write `content` to `path` relative to the vault root, creating parents.
    pub fn write_file(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }

    /// Put a media file into the media store.
    pub fn write_media(&self, name: &str, bytes: &[u8]) {
        fs::write(self.media_dir().join(name), bytes).unwrap();
    }

    /// Read a file relative to the vault root.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_file(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Every file under the vault root as a sorted list of slash-joined paths.
    pub fn list_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.root(), &self.root(), &mut files);
        files.sort();
        files
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_missing(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read_file(path);
        assert!(
            file_content.contains(content),
            "Expected {path} to contain {content:?}, got:\n{file_content}"
        );
    }
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap();
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_lists_files() {
        let vault = TestVault::new();
        vault.write_file("b/note.md", "x");
        vault.write_file("a.md", "y");
        vault.write_media("dog.png", b"png");

        assert_eq!(vault.list_files(), vec!["a.md", "b/note.md"]);
        vault.assert_file_contains("b/note.md", "x");
        vault.assert_file_missing("c.md");
        assert!(vault.media_dir().join("dog.png").is_file());
    }
}
