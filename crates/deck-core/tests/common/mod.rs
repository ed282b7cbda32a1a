//! Shared helpers for deck-core integration tests.

#![allow(dead_code)]

use deck_core::{
    CollectionSnapshot, DirMediaStore, NoProgress, NoteRecord, NoteRenderer, PlainTextRenderer,
    RenderError, ResolvedConfig, SyncEngine, SyncOptions, SyncReport,
};
use deck_test_utils::{CollectionFixture, TestVault};

pub fn snapshot(fixture: &CollectionFixture) -> CollectionSnapshot {
    serde_json::from_str(&fixture.to_json()).unwrap()
}

pub fn engine(vault: &TestVault, fixture: &CollectionFixture) -> SyncEngine {
    engine_with_renderer(vault, fixture, Box::new(PlainTextRenderer))
}

pub fn engine_with_renderer(
    vault: &TestVault,
    fixture: &CollectionFixture,
    renderer: Box<dyn NoteRenderer>,
) -> SyncEngine {
    SyncEngine::new(
        ResolvedConfig::for_destination(vault.root()),
        Box::new(snapshot(fixture)),
        Box::new(DirMediaStore::new(vault.media_dir())),
        renderer,
    )
}

pub fn sync(vault: &TestVault, fixture: &CollectionFixture) -> SyncReport {
    engine(vault, fixture)
        .sync(&SyncOptions::default(), &NoProgress)
        .unwrap()
}

/// Renderer that always fails, forcing the fallback body.
pub struct BrokenRenderer;

impl NoteRenderer for BrokenRenderer {
    fn render(&self, _note: &NoteRecord) -> Result<String, RenderError> {
        Err(RenderError::Unavailable {
            reason: "converter not installed".to_string(),
        })
    }
}

/// Single Basic note in `Languages::Spanish`.
pub fn spanish_fixture() -> CollectionFixture {
    let mut fixture = CollectionFixture::new();
    fixture
        .deck(1, "Languages::Spanish")
        .basic(1, 1, "Hola", "Hello", 100);
    fixture
}
