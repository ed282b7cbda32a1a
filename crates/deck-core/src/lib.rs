//! Core engine of deck-mirror
//!
//! Mirrors a hierarchical deck/note collection into a markdown tree, one way:
//!
//! - **Source state**: deck tree and note records read from a [`Collection`]
//! - **Target state**: classification of the existing destination tree
//! - **Diff engine**: pure identity-based reconciliation into an [`ActionPlan`]
//! - **Plan executor**: five ordered, failure-isolated phases
//! - **Index generator**: root and per-deck navigation documents
//!
//! # Architecture
//!
//! ```text
//!   Collection ──> SourceState ──┐
//!                                ├──> compute_plan ──> ActionPlan ──> executor ──> tree
//!   destination ──> TargetState ─┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use deck_core::{CollectionSnapshot, DirMediaStore, NoProgress, PlainTextRenderer};
//! use deck_core::{ResolvedConfig, SyncEngine, SyncOptions};
//!
//! let collection = CollectionSnapshot::load("export.json".as_ref())?;
//! let engine = SyncEngine::new(
//!     ResolvedConfig::for_destination("/vault"),
//!     Box::new(collection),
//!     Box::new(DirMediaStore::new("/media")),
//!     Box::new(PlainTextRenderer),
//! );
//! let report = engine.sync(&SyncOptions::default(), &NoProgress)?;
//! println!("{} items changed", report.total_changed());
//! ```

pub mod collection;
pub mod config;
pub mod diff;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod media;
pub mod model;
pub mod plan;
pub mod progress;
pub mod render;
pub mod source;
pub mod sync;
pub mod target;
pub mod text;

pub use collection::{Collection, CollectionSnapshot, SnapshotData};
pub use config::{ConfigResolver, ResolvedConfig, SyncConfig};
pub use diff::compute_plan;
pub use error::{Error, Result};
pub use index::IndexGenerator;
pub use media::{DirMediaStore, MediaStore};
pub use model::{DeckNode, FieldMap, NoteId, NoteKind, NoteRecord};
pub use plan::{ActionPlan, Category, ChangeKind, NoteConflict, PlanSummary, PlannedChange};
pub use progress::{NoProgress, ProgressSink};
pub use render::{NoteRenderer, PlainTextRenderer, RenderError};
pub use source::{SkipReason, SkippedNote, SourceBuilder, SourceState};
pub use sync::{CategoryCounts, ItemFailure, SyncEngine, SyncOptions, SyncReport};
pub use target::{TargetNoteFile, TargetScanner, TargetState};
