//! Shared test utilities for the deck-mirror workspace.
//!
//! This crate is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`collection`]: [`CollectionFixture`] builder producing collection exports
//! - [`vault`]: [`TestVault`] temporary destination + media store

pub mod collection;
pub mod vault;

pub use collection::CollectionFixture;
pub use vault::TestVault;
