//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Temp file next to `path` so the final rename stays on one filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

/// Best-effort removal of a temp file left behind by a failed write.
fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(?temp_path, error = %e, "Failed to clean up temp file");
    }
}

fn fill(file: &mut fs::File, reader: &mut dyn Read) -> std::io::Result<u64> {
    let written = std::io::copy(reader, file)?;
    file.flush()?;
    file.sync_all()?;
    Ok(written)
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so an interrupted write never leaves a
/// truncated file at `path`. Parent directories are created as needed.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic_from(path, &mut &content[..]).map(|_| ())
}

/// Stream `reader` into `path` atomically, returning the number of bytes written.
pub fn write_atomic_from(path: &Path, reader: &mut dyn Read) -> Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

    let written = match fill(&mut temp_file, reader) {
        Ok(n) => n,
        Err(e) => {
            drop(temp_file);
            discard_temp(&temp_path);
            return Err(Error::io(&temp_path, e));
        }
    };

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;
    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| {
        discard_temp(&temp_path);
        Error::io(path, e)
    })?;

    tracing::trace!(?path, bytes = written, "Wrote file atomically");
    Ok(written)
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Create a directory and all of its ancestors. Succeeds if it already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Remove a file.
///
/// Returns `Ok(false)` when the file was already absent, so re-running a
/// deletion is harmless.
pub fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(?path, "File already absent");
            Ok(false)
        }
        Err(e) => Err(Error::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("note.md");
        write_atomic(&path, b"body").unwrap();

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["note.md".to_string()]);
    }

    #[test]
    fn remove_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.md");
        fs::write(&path, "x").unwrap();

        assert!(remove_file(&path).unwrap());
        assert!(!remove_file(&path).unwrap());
    }

    #[test]
    fn failed_rename_discards_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupied.md");
        fs::create_dir(&path).unwrap();

        assert!(write_atomic(&path, b"body").is_err());
        assert!(!temp_path_for(&path).exists());
        assert!(path.is_dir());
    }
}
