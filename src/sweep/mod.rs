pub mod config;
pub mod cycle;
pub mod executor;
pub mod orphan;
pub mod retention;

pub use config::{RetentionThreshold, SweepConfig};
pub use cycle::{apply_plan, build_plan, orphan_cycle, orphan_cycle_at, plan_cycle, plan_cycle_at, run_cycle, run_cycle_at};
pub use executor::{DeletionOutcome, FailedDeletion, PartialDeletion, execute};
pub use orphan::{OrphanSweepOutcome, sweep_orphans};
pub use retention::{ClassifiedSegment, RetentionPlan, SkippedSegment, apply_retention, classify_segments};
