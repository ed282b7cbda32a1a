//! Media references and the external media store

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::FieldMap;

static IMAGE_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img.*?src=["'](.*?)["']"#).unwrap());
static SOUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[sound:([^\]]+)\]").unwrap());
static VIDEO_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<video.*?src=["'](.*?)["']"#).unwrap());
static PASTED_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(paste-[a-f0-9]+\.(?:jpg|jpeg|png|gif|webp|svg))").unwrap()
});
static MEDIA_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)src=["']([^"']*?\.(?:jpg|jpeg|png|gif|webp|svg|mp3|mp4|wav|ogg|webm))["']"#)
        .unwrap()
});

const NETWORK_PREFIXES: &[&str] = &["http:", "https:", "data:", "//"];

/// Whether a reference names a local file that can live in the flat assets folder.
fn is_local_media(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !name.trim().is_empty()
        && !NETWORK_PREFIXES.iter().any(|p| lower.starts_with(p))
        && !name.contains(['/', '\\'])
        && name != ".."
        && name != "."
}

/// Collect the local media files referenced by a note's fields.
///
/// Covers inline images, `[sound:...]` audio, inline video, pasted images and
/// any other `src` attribute with a known media extension. Network-sourced
/// references and anything that is not a bare file name are excluded.
pub fn referenced_media(fields: &FieldMap) -> BTreeSet<String> {
    let mut media = BTreeSet::new();
    for (_, value) in fields.iter() {
        if value.is_empty() {
            continue;
        }
        for pattern in [&*IMAGE_SRC, &*SOUND, &*VIDEO_SRC, &*PASTED_IMAGE, &*MEDIA_SRC] {
            for caps in pattern.captures_iter(value) {
                let name = caps[1].trim();
                if is_local_media(name) {
                    media.insert(name.to_string());
                } else {
                    tracing::trace!(reference = name, "Ignoring non-local media reference");
                }
            }
        }
    }
    media
}

/// Read access to the collection's media files.
pub trait MediaStore {
    fn exists(&self, name: &str) -> bool;

    fn open(&self, name: &str) -> std::io::Result<Box<dyn Read + '_>>;
}

/// Media store backed by a flat directory (the collection's media folder).
#[derive(Debug, Clone)]
pub struct DirMediaStore {
    dir: PathBuf,
}

impl DirMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MediaStore for DirMediaStore {
    fn exists(&self, name: &str) -> bool {
        self.dir.join(name).is_file()
    }

    fn open(&self, name: &str) -> std::io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.dir.join(name))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(value: &str) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("Front", value);
        map
    }

    #[test]
    fn collects_images_audio_and_video() {
        let fields = field(
            r#"<img src="dog.png"> [sound:bark.mp3] <video controls src='run.mp4'></video> paste-ab12.jpg"#,
        );
        let media: Vec<_> = referenced_media(&fields).into_iter().collect();
        assert_eq!(media, vec!["bark.mp3", "dog.png", "paste-ab12.jpg", "run.mp4"]);
    }

    #[test]
    fn excludes_network_and_nested_references() {
        let fields = field(
            r#"<img src="https://x.org/a.png"><img src="data:image/png;base64,AAA"><img src="../etc/passwd.png">"#,
        );
        assert!(referenced_media(&fields).is_empty());
    }

    #[test]
    fn dir_media_store_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let store = DirMediaStore::new(dir.path());

        assert!(store.exists("a.png"));
        assert!(!store.exists("b.png"));
        let mut bytes = Vec::new();
        store.open("a.png").unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"png");
    }
}
