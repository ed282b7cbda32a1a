//! SyncEngine implementation
//!
//! The SyncEngine builds both states, computes the action plan and hands it
//! to the executor.

use std::time::Instant;

use crate::Result;
use crate::collection::Collection;
use crate::config::ResolvedConfig;
use crate::diff::compute_plan;
use crate::media::MediaStore;
use crate::plan::ActionPlan;
use crate::progress::ProgressSink;
use crate::render::NoteRenderer;
use crate::source::{SourceBuilder, SourceState};
use crate::target::{TargetScanner, TargetState};

use super::executor::PlanExecutor;
use super::report::SyncReport;

/// Options for sync operations
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, compute the plan and report what would change without
    /// touching the destination. Actions are prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
}

/// Engine mirroring a collection into a destination tree
///
/// - **plan**: build both states and compute the action plan
/// - **sync**: plan, then apply the plan in phase order
pub struct SyncEngine {
    config: ResolvedConfig,
    collection: Box<dyn Collection>,
    media: Box<dyn MediaStore>,
    renderer: Box<dyn NoteRenderer>,
}

impl SyncEngine {
    pub fn new(
        config: ResolvedConfig,
        collection: Box<dyn Collection>,
        media: Box<dyn MediaStore>,
        renderer: Box<dyn NoteRenderer>,
    ) -> Self {
        Self {
            config,
            collection,
            media,
            renderer,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Read the source collection.
    pub fn build_source(&self, progress: &dyn ProgressSink) -> Result<SourceState> {
        SourceBuilder::new(self.collection.as_ref())
            .with_note_kinds(self.config.note_kinds.clone())
            .build(progress)
    }

    /// Scan the destination tree.
    pub fn scan_target(&self, progress: &dyn ProgressSink) -> Result<TargetState> {
        TargetScanner::new(&self.config.destination, &self.config.assets_folder).scan(progress)
    }

    /// Build both states and compute the plan. Nothing is written.
    ///
    /// # Errors
    ///
    /// Fails if the destination is unreachable or either state cannot be built.
    pub fn plan(&self, progress: &dyn ProgressSink) -> Result<(SourceState, ActionPlan)> {
        let (source, _, plan) = self.prepare(progress)?;
        Ok((source, plan))
    }

    fn prepare(&self, progress: &dyn ProgressSink) -> Result<(SourceState, TargetState, ActionPlan)> {
        let target = self.scan_target(progress)?;
        let source = self.build_source(progress)?;
        let plan = compute_plan(&source, &target);
        Ok((source, target, plan))
    }

    /// Run a full pass.
    ///
    /// Only fatal conditions are returned as errors, always before any
    /// mutation. Item failures are collected in the report.
    pub fn sync(&self, options: &SyncOptions, progress: &dyn ProgressSink) -> Result<SyncReport> {
        let started = Instant::now();
        let (source, target, plan) = self.prepare(progress)?;

        let mut report = SyncReport::new(options.dry_run);
        report.plan = plan.summary();
        report.source_skipped = source.skipped().len();
        for conflict in &plan.notes_blocked {
            report.notes.skipped += 1;
            report.record_warning(format!(
                "Note {} not written: {} is not a mirrored note file",
                conflict.note_id, conflict.path
            ));
        }

        if plan.is_empty() {
            tracing::info!("No changes detected");
        } else {
            PlanExecutor {
                root: target.root(),
                assets_folder: &self.config.assets_folder,
                source: &source,
                media: self.media.as_ref(),
                renderer: self.renderer.as_ref(),
                progress,
                dry_run: options.dry_run,
            }
            .execute(&plan, &mut report);
        }

        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            dry_run = options.dry_run,
            changed = report.total_changed(),
            failed = report.failures.len(),
            degraded = report.degraded,
            elapsed_ms = report.elapsed_ms,
            "Sync finished"
        );
        Ok(report)
    }
}
