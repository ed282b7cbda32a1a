//! Command implementations for deck-cli

pub mod diff;
pub mod sync;

pub use diff::run_diff;
pub use sync::run_sync;

use std::path::PathBuf;

use deck_core::{
    CollectionSnapshot, ConfigResolver, DirMediaStore, PlainTextRenderer, ResolvedConfig,
    SyncConfig, SyncEngine,
};

use crate::cli::SourceArgs;
use crate::error::Result;

/// Media folder name the collection keeps beside its database.
const DEFAULT_MEDIA_DIR: &str = "collection.media";

/// Merge config files with the command-line flags.
pub fn resolve_config(args: &SourceArgs) -> Result<ResolvedConfig> {
    let overrides = SyncConfig {
        collection: args.collection.clone(),
        destination: args.destination.clone(),
        media_dir: args.media_dir.clone(),
        assets_folder: args.assets_folder.clone(),
        ..SyncConfig::default()
    };

    let mut resolver = ConfigResolver::new().with_overrides(overrides);
    if let Some(ref path) = args.config {
        resolver = resolver.with_config_file(path);
    }
    Ok(resolver.resolve()?)
}

/// Load the collection export and wire up an engine for it.
pub fn open_engine(args: &SourceArgs) -> Result<SyncEngine> {
    let config = resolve_config(args)?;
    let collection_path = config.collection_path()?.to_path_buf();
    let media_dir = config
        .media_dir
        .clone()
        .unwrap_or_else(|| default_media_dir(&collection_path));
    tracing::debug!(?collection_path, ?media_dir, destination = ?config.destination, "Opening collection");

    let collection = CollectionSnapshot::load(&collection_path)?;
    Ok(SyncEngine::new(
        config,
        Box::new(collection),
        Box::new(DirMediaStore::new(media_dir)),
        Box::new(PlainTextRenderer),
    ))
}

fn default_media_dir(collection: &std::path::Path) -> PathBuf {
    collection
        .parent()
        .map(|dir| dir.join(DEFAULT_MEDIA_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR))
}
