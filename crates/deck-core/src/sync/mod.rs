//! Sync orchestration
//!
//! - **engine**: builds both states, plans and runs a pass
//! - **executor**: applies an action plan in phase order
//! - **report**: counts, failures and actions of a pass

mod engine;
mod executor;
mod report;

pub use engine::{SyncEngine, SyncOptions};
pub use report::{CategoryCounts, ItemFailure, SyncReport};
