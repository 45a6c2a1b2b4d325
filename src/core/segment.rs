//! WAL segment naming and the per-segment view built each cycle.
//!
//! A segment name is 24 upper-case hex digits: timeline, log id and segment
//! number, 8 digits each. Fixed width means lexical order equals log order.

use crate::core::{Result, SweepError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

lazy_static! {
    static ref SEGMENT_RE: Regex = Regex::new(r"^[0-9A-F]{24}$").unwrap();
    static ref MARKER_RE: Regex = Regex::new(r"^([0-9A-F]{24})\.(ready|done)$").unwrap();
    static ref BACKUP_LABEL_RE: Regex = Regex::new(r"^[0-9A-F]{24}\.[0-9A-F]{8}\.backup$").unwrap();
}

/// Validated WAL segment file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentName(String);

impl SegmentName {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if SEGMENT_RE.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(SweepError::InvalidSegmentName(name.to_string()))
        }
    }

    /// Builds a name from its numeric parts.
    pub fn from_parts(timeline: u32, log: u32, segment: u32) -> Self {
        Self(format!("{:08X}{:08X}{:08X}", timeline, log, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timeline(&self) -> u32 {
        self.field(0)
    }

    pub fn log(&self) -> u32 {
        self.field(1)
    }

    pub fn segment(&self) -> u32 {
        self.field(2)
    }

    fn field(&self, idx: usize) -> u32 {
        let start = idx * 8;
        // Validated as hex on construction.
        u32::from_str_radix(&self.0[start..start + 8], 16).unwrap_or(0)
    }

    /// Exact match only; prefixes and patterns never count.
    pub fn is(&self, other: &SegmentName) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SegmentName {
    type Error = SweepError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SegmentName> for String {
    fn from(name: SegmentName) -> Self {
        name.0
    }
}

/// Archival status read from `archive_status/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    #[default]
    Absent,
    Ready,
    Done,
}

impl MarkerState {
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            MarkerState::Absent => None,
            MarkerState::Ready => Some("ready"),
            MarkerState::Done => Some("done"),
        }
    }
}

impl fmt::Display for MarkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().unwrap_or("absent"))
    }
}

/// Parses `<segment>.ready` / `<segment>.done`. Markers for history files or
/// backup labels do not match.
pub fn parse_marker_name(file_name: &str) -> Option<(SegmentName, MarkerState)> {
    let caps = MARKER_RE.captures(file_name)?;
    let state = match &caps[2] {
        "ready" => MarkerState::Ready,
        "done" => MarkerState::Done,
        _ => return None,
    };
    Some((SegmentName(caps[1].to_string()), state))
}

pub fn is_segment_name(file_name: &str) -> bool {
    SEGMENT_RE.is_match(file_name)
}

/// `<segment>.<offset>.backup` files written by base backups.
pub fn is_backup_label(file_name: &str) -> bool {
    BACKUP_LABEL_RE.is_match(file_name)
}

/// Any archive-status marker that records a completed copy. This covers
/// segment markers as well as `.history.done` and `.backup.done`.
pub fn is_done_marker(file_name: &str) -> bool {
    file_name.len() > ".done".len() && file_name.ends_with(".done")
}

/// One segment as observed during the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalSegment {
    pub name: SegmentName,
    pub path: PathBuf,
    /// `None` when the modification time could not be read.
    pub modified: Option<SystemTime>,
    pub marker: MarkerState,
}

impl WalSegment {
    /// Age relative to `now`. A modification time in the future counts as
    /// zero age.
    pub fn age(&self, now: SystemTime) -> Option<Duration> {
        self.modified
            .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO))
    }
}
