use super::config::RetentionThreshold;
use crate::core::SegmentName;
use crate::core::segment::parse_marker_name;
use crate::storage::WalLayout;
use crate::storage::fs::{Removal, remove_file_idempotent};
use crate::storage::index::{MetaFile, scan_backup_labels, scan_done_markers};
use serde::Serialize;
use std::collections::HashSet;
use std::time::SystemTime;
use tracing::{Level, event};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanSweepOutcome {
    pub markers_removed: Vec<String>,
    pub labels_removed: Vec<String>,
    /// Files or directories that could not be handled, with the error.
    pub failures: Vec<String>,
    pub dry_run: bool,
}

impl OrphanSweepOutcome {
    pub fn removed_count(&self) -> usize {
        self.markers_removed.len() + self.labels_removed.len()
    }
}

/// Removes `.done` markers and backup labels older than `threshold`, whether
/// or not their segment still exists.
///
/// Segment files and `.ready` markers are never touched, and neither are the
/// markers of segments in `claimed`. Best-effort: a failure on one file is
/// recorded and the sweep carries on.
pub fn sweep_orphans(
    layout: &WalLayout,
    threshold: RetentionThreshold,
    now: SystemTime,
    dry_run: bool,
    claimed: &HashSet<SegmentName>,
) -> OrphanSweepOutcome {
    let mut outcome = OrphanSweepOutcome {
        dry_run,
        ..Default::default()
    };

    match scan_done_markers(layout) {
        Ok(mut markers) => {
            markers.retain(|marker| match parse_marker_name(&marker.name) {
                Some((segment, _)) if claimed.contains(&segment) => {
                    event!(Level::DEBUG, file = %marker.name, "marker owned by deletion pass, keeping");
                    false
                }
                _ => true,
            });
            outcome.markers_removed = remove_stale(markers, threshold, now, dry_run, &mut outcome.failures);
        }
        Err(e) => {
            event!(Level::WARN, error = %e, "cannot list archive status markers");
            outcome.failures.push(e.to_string());
        }
    }

    match scan_backup_labels(layout) {
        Ok(labels) => {
            outcome.labels_removed = remove_stale(labels, threshold, now, dry_run, &mut outcome.failures);
        }
        Err(e) => {
            event!(Level::WARN, error = %e, "cannot list backup labels");
            outcome.failures.push(e.to_string());
        }
    }

    event!(
        Level::INFO,
        markers = outcome.markers_removed.len(),
        labels = outcome.labels_removed.len(),
        failures = outcome.failures.len(),
        dry_run,
        "orphan sweep finished"
    );
    outcome
}

fn remove_stale(
    files: Vec<MetaFile>,
    threshold: RetentionThreshold,
    now: SystemTime,
    dry_run: bool,
    failures: &mut Vec<String>,
) -> Vec<String> {
    let mut removed = Vec::new();
    for file in files {
        let Some(modified) = file.modified else {
            event!(Level::DEBUG, file = %file.name, "unknown age, keeping");
            continue;
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if !threshold.is_exceeded_by(age) {
            continue;
        }

        if dry_run {
            event!(Level::INFO, file = %file.name, "would remove stale file");
            removed.push(file.name);
            continue;
        }

        match remove_file_idempotent(&file.path) {
            Ok(Removal::Removed) => {
                event!(Level::INFO, file = %file.name, "removed stale file");
                removed.push(file.name);
            }
            Ok(Removal::AlreadyGone) => {
                event!(Level::DEBUG, file = %file.name, "stale file already gone");
            }
            Err(e) => {
                event!(Level::WARN, file = %file.name, error = %e, "cannot remove stale file");
                failures.push(format!("{}: {}", file.name, e));
            }
        }
    }
    removed
}
