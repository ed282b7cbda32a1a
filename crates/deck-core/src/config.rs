//! Layered sync configuration
//!
//! Sources are merged in order, later layers overriding earlier ones field by
//! field:
//! 1. Built-in defaults
//! 2. Global config (`<config_dir>/deckmirror/config.toml`), if present
//! 3. An explicit config file (TOML, JSON or YAML)
//! 4. Programmatic overrides (command-line flags)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deck_fs::{ConfigStore, MirrorPath};
use serde::{Deserialize, Serialize};

use crate::model::NoteKind;
use crate::{Error, Result};

/// Folder under the destination root that receives media assets.
pub const DEFAULT_ASSETS_FOLDER: &str = "assets";

const APP_DIR: &str = "deckmirror";
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// One configuration layer. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Collection export to read
    pub collection: Option<PathBuf>,
    /// Root of the mirrored tree
    pub destination: Option<PathBuf>,
    /// Flat folder holding the collection's media files
    pub media_dir: Option<PathBuf>,
    pub assets_folder: Option<String>,
    /// Note-type name to kind, overriding the built-in classification
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub note_kinds: BTreeMap<String, NoteKind>,
}

impl SyncConfig {
    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &SyncConfig) {
        if other.collection.is_some() {
            self.collection.clone_from(&other.collection);
        }
        if other.destination.is_some() {
            self.destination.clone_from(&other.destination);
        }
        if other.media_dir.is_some() {
            self.media_dir.clone_from(&other.media_dir);
        }
        if other.assets_folder.is_some() {
            self.assets_folder.clone_from(&other.assets_folder);
        }
        self.note_kinds
            .extend(other.note_kinds.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

/// Effective configuration after merging and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub collection: Option<PathBuf>,
    pub destination: PathBuf,
    pub media_dir: Option<PathBuf>,
    pub assets_folder: String,
    pub note_kinds: BTreeMap<String, NoteKind>,
}

impl ResolvedConfig {
    /// Configuration for a destination with every other setting at its default.
    pub fn for_destination(destination: impl Into<PathBuf>) -> Self {
        Self {
            collection: None,
            destination: destination.into(),
            media_dir: None,
            assets_folder: DEFAULT_ASSETS_FOLDER.to_string(),
            note_kinds: BTreeMap::new(),
        }
    }

    /// The collection export path, required by callers that load one.
    pub fn collection_path(&self) -> Result<&Path> {
        self.collection
            .as_deref()
            .ok_or_else(|| Error::invalid_config("no collection configured"))
    }

    fn from_layer(layer: SyncConfig) -> Result<Self> {
        let destination = layer
            .destination
            .ok_or_else(|| Error::invalid_config("no destination configured"))?;
        let assets_folder = layer
            .assets_folder
            .unwrap_or_else(|| DEFAULT_ASSETS_FOLDER.to_string());
        validate_assets_folder(&assets_folder)?;

        Ok(Self {
            collection: layer.collection,
            destination,
            media_dir: layer.media_dir,
            assets_folder,
            note_kinds: layer.note_kinds,
        })
    }
}

/// The assets folder must be a single plain segment directly under the root.
fn validate_assets_folder(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == ".."
        || MirrorPath::is_metadata_dir(name);
    if invalid {
        return Err(Error::invalid_config(format!(
            "assets folder must be a single folder name, got {name:?}"
        )));
    }
    Ok(())
}

/// Resolves configuration by merging multiple sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    config_file: Option<PathBuf>,
    overrides: SyncConfig,
    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom global config directory instead of the platform one.
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Add an explicit config file layer. It must exist.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Add the top layer, typically built from command-line flags.
    pub fn with_overrides(mut self, overrides: SyncConfig) -> Self {
        self.overrides = overrides;
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let store = ConfigStore::new();
        let mut merged = SyncConfig::default();

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join(GLOBAL_CONFIG_FILE);
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config");
                let layer: SyncConfig = store.load(&global_config_path)?;
                merged.merge(&layer);
            } else {
                tracing::debug!(?global_config_path, "No global config found, skipping");
            }
        }

        if let Some(ref config_path) = self.config_file {
            if !config_path.is_file() {
                return Err(Error::invalid_config(format!(
                    "config file not found: {}",
                    config_path.display()
                )));
            }
            tracing::debug!(?config_path, "Loading config file");
            let layer: SyncConfig = store.load(config_path)?;
            merged.merge(&layer);
        }

        merged.merge(&self.overrides);
        ResolvedConfig::from_layer(merged)
    }
}
