pub mod config;
pub mod postgres;

use crate::core::{Result, SegmentName, SweepError};
use async_trait::async_trait;
use tracing::{Level, event};

/// Commands the sweeper needs from the live database.
///
/// Every method may block on the network; callers bound them if they need to.
#[async_trait]
pub trait WalControl: Send + Sync {
    /// Closes the current segment and starts a new one.
    async fn switch_wal(&self) -> Result<()>;

    /// Flushes state and advances the recovery start point.
    async fn checkpoint(&self) -> Result<()>;

    /// Raw file name of the segment currently being written.
    async fn current_segment(&self) -> Result<String>;
}

/// Forces a log switch and then a checkpoint.
///
/// Any failure aborts the cycle; nothing on disk has been inspected or
/// touched at this point.
pub async fn trigger_checkpoint(control: &dyn WalControl) -> Result<()> {
    control.switch_wal().await.map_err(|err| {
        event!(Level::ERROR, error = %err, "log switch failed");
        err
    })?;
    event!(Level::DEBUG, "log switch issued");

    control.checkpoint().await.map_err(|err| {
        event!(Level::ERROR, error = %err, "checkpoint failed");
        err
    })?;
    event!(Level::INFO, "checkpoint completed");
    Ok(())
}

/// Fetches and validates the active segment name.
///
/// A value that is not a segment name cannot protect anything, so it is a
/// fatal error rather than an empty exclusion.
pub async fn resolve_active_segment(control: &dyn WalControl) -> Result<SegmentName> {
    let raw = control.current_segment().await?;
    let active = SegmentName::parse(&raw).map_err(|_| {
        SweepError::CommandError(format!(
            "database reported '{}' as its current segment",
            raw.trim()
        ))
    })?;
    event!(Level::INFO, active = %active, "resolved active segment");
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<&'static str>>,
        fail_switch: bool,
        current: String,
    }

    #[async_trait]
    impl WalControl for Scripted {
        async fn switch_wal(&self) -> Result<()> {
            self.calls.lock().unwrap().push("switch");
            if self.fail_switch {
                return Err(SweepError::ConnectionError("refused".into()));
            }
            Ok(())
        }

        async fn checkpoint(&self) -> Result<()> {
            self.calls.lock().unwrap().push("checkpoint");
            Ok(())
        }

        async fn current_segment(&self) -> Result<String> {
            self.calls.lock().unwrap().push("current");
            Ok(self.current.clone())
        }
    }

    #[tokio::test]
    async fn test_switch_runs_before_checkpoint() {
        let control = Scripted::default();
        trigger_checkpoint(&control).await.unwrap();
        assert_eq!(*control.calls.lock().unwrap(), vec!["switch", "checkpoint"]);
    }

    #[tokio::test]
    async fn test_failed_switch_skips_checkpoint() {
        let control = Scripted {
            fail_switch: true,
            ..Default::default()
        };
        let err = trigger_checkpoint(&control).await.unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(*control.calls.lock().unwrap(), vec!["switch"]);
    }

    #[tokio::test]
    async fn test_resolve_rejects_garbage() {
        let control = Scripted {
            current: "not-a-segment".into(),
            ..Default::default()
        };
        let err = resolve_active_segment(&control).await.unwrap_err();
        assert!(matches!(err, SweepError::CommandError(_)));
    }

    #[tokio::test]
    async fn test_resolve_trims() {
        let control = Scripted {
            current: "000000010000000000000004\n".into(),
            ..Default::default()
        };
        let active = resolve_active_segment(&control).await.unwrap();
        assert_eq!(active.segment(), 4);
    }
}
