use crate::core::{Result, SweepError};
use crate::storage::WalLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Minimum age, measured from modification time, before an archived segment
/// or a stale metadata file may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RetentionThreshold(Duration);

impl RetentionThreshold {
    pub const DEFAULT_DAYS: u64 = 10;

    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn days(days: u64) -> Self {
        Self(Duration::from_secs(days * SECS_PER_DAY))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Strictly older than the threshold.
    pub fn is_exceeded_by(&self, age: Duration) -> bool {
        age > self.0
    }

    /// Accepts `10d`, `36h`, `90m`, `45s`, or a bare number of days.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let split = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());
        let (digits, unit) = input.split_at(split);

        let value: u64 = digits.parse().map_err(|_| {
            SweepError::ConfigError(format!("Invalid retention '{}': expected e.g. 10d", input))
        })?;

        let multiplier = match unit.trim() {
            "" | "d" => SECS_PER_DAY,
            "h" => 60 * 60,
            "m" => 60,
            "s" => 1,
            other => {
                return Err(SweepError::ConfigError(format!(
                    "Invalid retention unit '{}': use d, h, m or s",
                    other
                )));
            }
        };

        let secs = value.checked_mul(multiplier).ok_or_else(|| {
            SweepError::ConfigError(format!("Retention '{}' is too large", input))
        })?;
        Ok(Self(Duration::from_secs(secs)))
    }
}

impl Default for RetentionThreshold {
    fn default() -> Self {
        Self::days(Self::DEFAULT_DAYS)
    }
}

impl FromStr for RetentionThreshold {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RetentionThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs % SECS_PER_DAY == 0 {
            write!(f, "{}d", secs / SECS_PER_DAY)
        } else if secs % 3600 == 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

/// Everything a sweep cycle needs besides the database handle.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub wal_dir: PathBuf,
    /// Defaults to `<wal_dir>/archive_status`.
    pub archive_status_dir: Option<PathBuf>,
    pub retention: RetentionThreshold,
    /// Report what would be removed without removing anything.
    pub dry_run: bool,
}

impl SweepConfig {
    pub fn new<P: AsRef<Path>>(wal_dir: P) -> Self {
        Self {
            wal_dir: wal_dir.as_ref().to_path_buf(),
            archive_status_dir: None,
            retention: RetentionThreshold::default(),
            dry_run: false,
        }
    }

    pub fn retention(mut self, retention: RetentionThreshold) -> Self {
        self.retention = retention;
        self
    }

    pub fn archive_status_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.archive_status_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn layout(&self) -> WalLayout {
        let layout = WalLayout::new(&self.wal_dir);
        match &self.archive_status_dir {
            Some(dir) => layout.with_archive_status_dir(dir),
            None => layout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.wal_dir.as_os_str().is_empty() {
            return Err(SweepError::ConfigError("WAL directory cannot be empty".to_string()));
        }
        if self.retention.as_duration().is_zero() {
            return Err(SweepError::ConfigError("Retention must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ten_days() {
        assert_eq!(
            RetentionThreshold::default().as_duration(),
            Duration::from_secs(10 * 24 * 3600)
        );
        assert_eq!(RetentionThreshold::default().to_string(), "10d");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(RetentionThreshold::parse("7d").unwrap(), RetentionThreshold::days(7));
        assert_eq!(RetentionThreshold::parse("7").unwrap(), RetentionThreshold::days(7));
        assert_eq!(
            RetentionThreshold::parse("36h").unwrap().as_duration(),
            Duration::from_secs(36 * 3600)
        );
        assert_eq!(
            RetentionThreshold::parse("90m").unwrap().as_duration(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(
            RetentionThreshold::parse(" 45s ").unwrap().as_duration(),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_parse_rejects() {
        assert!(RetentionThreshold::parse("").is_err());
        assert!(RetentionThreshold::parse("d").is_err());
        assert!(RetentionThreshold::parse("10w").is_err());
        assert!(RetentionThreshold::parse("-1d").is_err());
        assert!(RetentionThreshold::parse("99999999999999999999d").is_err());
    }

    #[test]
    fn test_threshold_is_strict() {
        let threshold = RetentionThreshold::days(10);
        assert!(!threshold.is_exceeded_by(Duration::from_secs(10 * 24 * 3600)));
        assert!(threshold.is_exceeded_by(Duration::from_secs(10 * 24 * 3600 + 1)));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for input in ["3d", "36h", "90m", "45s"] {
            let threshold = RetentionThreshold::parse(input).unwrap();
            assert_eq!(threshold.to_string(), input);
        }
    }

    #[test]
    fn test_layout_and_validate() {
        let config = SweepConfig::new("/pg/pg_wal");
        assert_eq!(
            config.layout().archive_status_dir(),
            Path::new("/pg/pg_wal/archive_status")
        );
        assert!(config.validate().is_ok());

        let custom = SweepConfig::new("/pg/pg_wal").archive_status_dir("/elsewhere");
        assert_eq!(custom.layout().archive_status_dir(), Path::new("/elsewhere"));

        let zero = SweepConfig::new("/pg/pg_wal").retention(RetentionThreshold::new(Duration::ZERO));
        assert!(zero.validate().is_err());
        assert!(SweepConfig::new("").validate().is_err());
    }
}
