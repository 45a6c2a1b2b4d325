use crate::core::SegmentName;
use crate::sweep::executor::DeletionOutcome;
use crate::sweep::orphan::OrphanSweepOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Stopped before the deletion stage; nothing was removed.
    Aborted { stage: String, error: String },
}

/// What one sweep cycle did. Built fresh per run and only used for logging
/// and output.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub wal_dir: String,
    pub retention: String,
    pub dry_run: bool,
    #[serde(flatten)]
    pub status: RunStatus,
    pub active_segment: Option<SegmentName>,
    pub deletion: Option<DeletionOutcome>,
    pub orphans: Option<OrphanSweepOutcome>,
}

impl RunReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted { .. })
    }

    pub fn deleted_count(&self) -> usize {
        self.deletion.as_ref().map_or(0, |d| d.deleted_count())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would delete" } else { "deleted" };

        writeln!(f, "WAL sweep of {} (retention {})", self.wal_dir, self.retention)?;
        writeln!(f, "  started:  {}", self.started_at.to_rfc3339())?;
        writeln!(f, "  finished: {}", self.finished_at.to_rfc3339())?;

        if let RunStatus::Aborted { stage, error } = &self.status {
            writeln!(f, "  ABORTED during {}: {}", stage, error)?;
            return writeln!(f, "  no files were removed");
        }

        if let Some(active) = &self.active_segment {
            writeln!(f, "  active segment: {}", active)?;
        }

        if let Some(deletion) = &self.deletion {
            writeln!(f, "  segments {}: {}", verb, deletion.deleted_count())?;
            for name in &deletion.deleted {
                writeln!(f, "    {}", name)?;
            }
            writeln!(f, "  segments skipped: {}", deletion.skipped_count())?;
            for (reason, count) in deletion.skip_counts() {
                writeln!(f, "    {}: {}", reason, count)?;
            }
            for partial in &deletion.partial {
                writeln!(f, "  marker left behind for {}: {}", partial.name, partial.error)?;
            }
            for failed in &deletion.failed {
                writeln!(f, "  could not delete {}: {}", failed.name, failed.error)?;
            }
        }

        if let Some(orphans) = &self.orphans {
            writeln!(
                f,
                "  stale markers {}: {}, backup labels {}: {}",
                verb,
                orphans.markers_removed.len(),
                verb,
                orphans.labels_removed.len()
            )?;
            for failure in &orphans.failures {
                writeln!(f, "  orphan sweep error: {}", failure)?;
            }
        }
        Ok(())
    }
}
