//! Filesystem layer for deck-mirror
//!
//! Provides slash-normalized relative paths, atomic I/O, content hashing,
//! filename sanitization and the reserved names of the mirrored layout.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod sanitize;

pub use checksum::content_hash;
pub use config::ConfigStore;
pub use constants::{MirrorPath, deck_index_filename, is_index_filename};
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use sanitize::{note_filename, sanitize_filename};
