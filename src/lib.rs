// ============================================================================
// walsweep Library
// ============================================================================

//! Retention and cleanup of archived PostgreSQL WAL segments.
//!
//! A cycle forces a log switch and checkpoint, asks the server for the
//! segment it is writing, scans the WAL directory, and deletes only
//! segments that are confirmed archived (`.done` marker), older than the
//! retention threshold, and not active. Stale `.done` markers and backup
//! labels are swept separately.
//!
//! # Examples
//!
//! ```no_run
//! use walsweep::{DatabaseConfig, PostgresControl, RetentionThreshold, SweepConfig, run_cycle};
//!
//! # tokio_test::block_on(async {
//! let db = DatabaseConfig::from_url("postgres://walsweep@localhost/postgres").unwrap();
//! let control = PostgresControl::connect(&db).await.unwrap();
//!
//! let config = SweepConfig::new("/var/lib/postgresql/16/main/pg_wal")
//!     .retention(RetentionThreshold::days(10));
//! let report = run_cycle(&control, &config).await;
//! println!("{}", report);
//! # });
//! ```

pub mod connection;
pub mod core;
pub mod result;
pub mod storage;
pub mod sweep;

// Re-export main types for convenience
pub use connection::{WalControl, config::DatabaseConfig, postgres::PostgresControl};
pub use core::{LifecycleState, MarkerState, Result, SegmentName, SkipReason, SweepError, WalSegment};
pub use result::{RunReport, RunStatus};
pub use storage::WalLayout;
pub use sweep::{
    DeletionOutcome, OrphanSweepOutcome, RetentionPlan, RetentionThreshold, SweepConfig,
    orphan_cycle, plan_cycle, run_cycle,
};
