use crate::core::segment::{MarkerState, SegmentName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a segment sits in its lifecycle this cycle. Nothing here is
/// persisted; every cycle recomputes it from what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// The segment the database is appending to.
    Writing,
    /// Closed but not confirmed archived.
    ClosedUnarchived,
    /// Confirmed archived, age not yet checked or too young.
    Archived,
    /// Archived and older than the retention threshold.
    Eligible,
}

/// Why a segment stays on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    IsActive,
    NotArchived,
    TooYoung,
    /// Modification time could not be read.
    Unclassifiable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::IsActive => "active",
            SkipReason::NotArchived => "not archived",
            SkipReason::TooYoung => "too young",
            SkipReason::Unclassifiable => "unclassifiable",
        };
        f.write_str(s)
    }
}

impl LifecycleState {
    /// Skip reason for a segment that did not reach `Eligible`.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            LifecycleState::Writing => Some(SkipReason::IsActive),
            LifecycleState::ClosedUnarchived => Some(SkipReason::NotArchived),
            LifecycleState::Archived => Some(SkipReason::TooYoung),
            LifecycleState::Eligible => None,
        }
    }
}

/// Classifies one segment from its marker and the active segment name.
///
/// Active status outranks any marker: a segment that is being written is
/// `Writing` even if a `.done` marker claims otherwise. Only a `.done` marker
/// moves a closed segment to `Archived`. `Eligible` is assigned later by the
/// retention filter once age is known.
pub fn classify(name: &SegmentName, marker: MarkerState, active: &SegmentName) -> LifecycleState {
    if name.is(active) {
        return LifecycleState::Writing;
    }
    match marker {
        MarkerState::Done => LifecycleState::Archived,
        MarkerState::Ready | MarkerState::Absent => LifecycleState::ClosedUnarchived,
    }
}
