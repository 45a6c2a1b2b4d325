use super::retention::{RetentionPlan, SkippedSegment};
use crate::core::{LifecycleState, SegmentName, SkipReason};
use crate::storage::fs::{Removal, remove_file_idempotent};
use crate::storage::WalLayout;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{Level, event};

/// A segment removed while its `.done` marker stayed behind. The orphan
/// sweep picks the marker up on a later cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialDeletion {
    pub name: SegmentName,
    pub error: String,
}

/// A segment that could not be removed. Its marker is kept so the pair is
/// retried as a whole next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub name: SegmentName,
    pub error: String,
}

/// Per-cycle deletion result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// Segments removed (or, in a dry run, that would have been).
    pub deleted: Vec<SegmentName>,
    /// Subset of `deleted` that was already gone when we got to it.
    pub already_gone: usize,
    pub skipped: Vec<SkippedSegment>,
    pub partial: Vec<PartialDeletion>,
    pub failed: Vec<FailedDeletion>,
    pub dry_run: bool,
}

impl DeletionOutcome {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skipped {
            *counts.entry(skip.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Segments whose `.done` marker this pass is responsible for: the ones
    /// it deleted (or would delete) and the ones it failed to delete.
    pub fn claimed_segments(&self) -> HashSet<SegmentName> {
        self.deleted
            .iter()
            .chain(self.failed.iter().map(|f| &f.name))
            .cloned()
            .collect()
    }
}

/// Removes every eligible segment and then its `.done` marker.
///
/// Only `plan.eligible` is ever touched. Missing files count as removed, so
/// running the same plan twice leaves the directory as running it once.
/// Errors never abort the loop; they are logged and reported.
pub fn execute(plan: RetentionPlan, layout: &WalLayout, dry_run: bool) -> DeletionOutcome {
    let mut outcome = DeletionOutcome {
        skipped: plan.skipped,
        dry_run,
        ..Default::default()
    };

    for entry in plan.eligible {
        let name = entry.segment.name;
        if entry.state != LifecycleState::Eligible {
            event!(Level::WARN, segment = %name, state = ?entry.state, "refusing to delete unfiltered segment");
            outcome.skipped.push(SkippedSegment {
                name,
                reason: SkipReason::Unclassifiable,
            });
            continue;
        }

        if dry_run {
            event!(Level::INFO, segment = %name, "would delete segment");
            outcome.deleted.push(name);
            continue;
        }

        match remove_file_idempotent(&entry.segment.path) {
            Ok(Removal::Removed) => {
                event!(Level::INFO, segment = %name, "deleted segment");
            }
            Ok(Removal::AlreadyGone) => {
                event!(Level::INFO, segment = %name, "segment already gone");
                outcome.already_gone += 1;
            }
            Err(e) => {
                event!(Level::WARN, segment = %name, error = %e, "failed to delete segment");
                outcome.failed.push(FailedDeletion {
                    name,
                    error: e.to_string(),
                });
                continue;
            }
        }

        let marker = layout.done_marker_path(&name);
        if let Err(e) = remove_file_idempotent(&marker) {
            event!(
                Level::WARN,
                segment = %name,
                marker = %marker.display(),
                error = %e,
                "segment deleted but marker removal failed"
            );
            outcome.partial.push(PartialDeletion {
                name: name.clone(),
                error: e.to_string(),
            });
        }
        outcome.deleted.push(name);
    }

    event!(
        Level::INFO,
        deleted = outcome.deleted_count(),
        skipped = outcome.skipped_count(),
        partial = outcome.partial.len(),
        failed = outcome.failed.len(),
        dry_run,
        "deletion pass finished"
    );
    outcome
}
