use super::config::SweepConfig;
use super::executor::{DeletionOutcome, execute};
use super::orphan::{OrphanSweepOutcome, sweep_orphans};
use super::retention::{RetentionPlan, apply_retention, classify_segments};
use crate::connection::{WalControl, resolve_active_segment, trigger_checkpoint};
use crate::core::{Result, SegmentName, SweepError};
use crate::result::{RunReport, RunStatus};
use crate::storage::index::scan_segments;
use chrono::Utc;
use std::collections::HashSet;
use std::time::SystemTime;
use tracing::{Instrument, Level, event, info_span};

/// Runs one full cycle: checkpoint, resolve, scan, classify, filter, delete,
/// then sweep orphans.
///
/// Never returns an error. A failure before the deletion stage yields an
/// `Aborted` report with nothing removed; later failures are per-file and
/// recorded in the report.
pub async fn run_cycle(control: &dyn WalControl, config: &SweepConfig) -> RunReport {
    run_cycle_at(control, config, SystemTime::now()).await
}

/// `run_cycle` with an explicit clock for ages.
pub async fn run_cycle_at(
    control: &dyn WalControl,
    config: &SweepConfig,
    now: SystemTime,
) -> RunReport {
    let span = info_span!(
        "sweep.cycle",
        wal_dir = %config.wal_dir.display(),
        retention = %config.retention,
        dry_run = config.dry_run
    );
    full_cycle(control, config, now).instrument(span).await
}

async fn full_cycle(control: &dyn WalControl, config: &SweepConfig, now: SystemTime) -> RunReport {
    let mut report = new_report(config);

    if let Err(err) = config.validate() {
        return abort(report, "config", err);
    }

    if let Err(err) = trigger_checkpoint(control).await {
        return abort(report, "checkpoint", err);
    }

    let active = match resolve_active_segment(control).await {
        Ok(active) => active,
        Err(err) => return abort(report, "resolve active segment", err),
    };
    report.active_segment = Some(active.clone());

    let plan = match build_plan(config, &active, now) {
        Ok(plan) => plan,
        Err(err) => return abort(report, "scan", err),
    };

    let (deletion, orphans) = apply_plan(plan, config, now);
    report.deletion = Some(deletion);
    report.orphans = Some(orphans);
    finish(report)
}

/// Read-only preview. Resolves the active segment without switching or
/// checkpointing and reports what a run would delete right now.
pub async fn plan_cycle(control: &dyn WalControl, config: &SweepConfig) -> RunReport {
    plan_cycle_at(control, config, SystemTime::now()).await
}

pub async fn plan_cycle_at(
    control: &dyn WalControl,
    config: &SweepConfig,
    now: SystemTime,
) -> RunReport {
    let span = info_span!("sweep.plan", wal_dir = %config.wal_dir.display());
    preview(control, config.clone().dry_run(true), now)
        .instrument(span)
        .await
}

async fn preview(control: &dyn WalControl, config: SweepConfig, now: SystemTime) -> RunReport {
    let mut report = new_report(&config);

    if let Err(err) = config.validate() {
        return abort(report, "config", err);
    }

    let active = match resolve_active_segment(control).await {
        Ok(active) => active,
        Err(err) => return abort(report, "resolve active segment", err),
    };
    report.active_segment = Some(active.clone());

    let plan = match build_plan(&config, &active, now) {
        Ok(plan) => plan,
        Err(err) => return abort(report, "scan", err),
    };

    let (deletion, orphans) = apply_plan(plan, &config, now);
    report.deletion = Some(deletion);
    report.orphans = Some(orphans);
    finish(report)
}

/// Orphan sweep on its own; needs no database.
pub fn orphan_cycle(config: &SweepConfig) -> RunReport {
    orphan_cycle_at(config, SystemTime::now())
}

pub fn orphan_cycle_at(config: &SweepConfig, now: SystemTime) -> RunReport {
    let mut report = new_report(config);
    let span = info_span!("sweep.orphans", wal_dir = %config.wal_dir.display());
    let _enter = span.enter();

    if let Err(err) = config.validate() {
        return abort(report, "config", err);
    }

    report.orphans = Some(sweep_orphans(
        &config.layout(),
        config.retention,
        now,
        config.dry_run,
        &HashSet::new(),
    ));
    finish(report)
}

/// Scan, classify and filter. Pure apart from the directory read.
pub fn build_plan(config: &SweepConfig, active: &SegmentName, now: SystemTime) -> Result<RetentionPlan> {
    let segments = scan_segments(&config.layout())?;
    let classified = classify_segments(segments, active);
    let plan = apply_retention(classified, config.retention, now);
    event!(
        Level::INFO,
        eligible = plan.eligible.len(),
        skipped = plan.skipped.len(),
        "retention plan built"
    );
    Ok(plan)
}

/// Executes a plan and then sweeps orphans, honouring `config.dry_run`.
///
/// The sweep leaves alone the markers the deletion pass claimed. A failed
/// deletion keeps its marker so the next cycle retries the pair, and a dry
/// run does not count a planned deletion's marker a second time.
pub fn apply_plan(
    plan: RetentionPlan,
    config: &SweepConfig,
    now: SystemTime,
) -> (DeletionOutcome, OrphanSweepOutcome) {
    let layout = config.layout();
    let deletion = execute(plan, &layout, config.dry_run);
    let claimed = deletion.claimed_segments();
    let orphans = sweep_orphans(&layout, config.retention, now, config.dry_run, &claimed);
    (deletion, orphans)
}

fn new_report(config: &SweepConfig) -> RunReport {
    let now = Utc::now();
    RunReport {
        started_at: now,
        finished_at: now,
        wal_dir: config.wal_dir.display().to_string(),
        retention: config.retention.to_string(),
        dry_run: config.dry_run,
        status: RunStatus::Completed,
        active_segment: None,
        deletion: None,
        orphans: None,
    }
}

fn abort(mut report: RunReport, stage: &str, err: SweepError) -> RunReport {
    event!(Level::ERROR, stage, error = %err, "sweep cycle aborted");
    report.status = RunStatus::Aborted {
        stage: stage.to_string(),
        error: err.to_string(),
    };
    report.finished_at = Utc::now();
    report
}

fn finish(mut report: RunReport) -> RunReport {
    report.finished_at = Utc::now();
    event!(
        Level::INFO,
        deleted = report.deleted_count(),
        orphans = report.orphans.as_ref().map_or(0, |o| o.removed_count()),
        "sweep cycle completed"
    );
    report
}
