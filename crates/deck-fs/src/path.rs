//! Normalized relative path handling for the mirrored tree

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A destination-relative path normalized to forward slashes.
///
/// Empty and `.` components are dropped, so `Languages//Spanish/` and
/// `./Languages/Spanish` both normalize to `Languages/Spanish`. The empty path
/// denotes the destination root. Conversion to a platform-native path only
/// happens at I/O boundaries through [`NormalizedPath::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let absolute = raw.starts_with('/');
        let joined = raw
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        let inner = if absolute { format!("/{joined}") } else { joined };
        Self { inner }
    }

    /// The destination root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-clean segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path = path.join(segment.as_ref());
        }
        path
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is the destination root.
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.inner, segment))
        }
    }

    /// Get the parent directory. The parent of a top-level entry is the root.
    pub fn parent(&self) -> Option<Self> {
        if self.inner.is_empty() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => Some(Self::root()),
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments; the root has depth zero.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether `self` lies strictly below `ancestor`.
    pub fn starts_with(&self, ancestor: &NormalizedPath) -> bool {
        if ancestor.is_root() {
            return !self.is_root();
        }
        self.inner
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Resolve against a native base directory for I/O.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        let mut native = base.to_path_buf();
        for segment in self.segments() {
            native.push(segment);
        }
        native
    }

    /// Convert to a platform-native PathBuf.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
