//! Error types for deck-core
//!
//! Only fatal conditions are represented here. Failures of a single note,
//! asset or index document are recorded in the sync report instead.

use std::path::PathBuf;

/// Result type for deck-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a sync pass before any mutation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The destination root does not exist or is not a directory
    #[error("Destination not reachable at {path}: {reason}")]
    DestinationUnreachable { path: PathBuf, reason: String },

    /// Walking the destination tree failed
    #[error("Failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    /// The source collection could not be read
    #[error("Collection error: {message}")]
    Collection { message: String },

    /// Required configuration is missing or invalid
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Filesystem error from deck-fs
    #[error(transparent)]
    Fs(#[from] deck_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn collection(message: impl Into<String>) -> Self {
        Self::Collection {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
