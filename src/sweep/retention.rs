//! Classification and retention: the two pure stages between the directory
//! scan and the executor.

use super::config::RetentionThreshold;
use crate::core::{LifecycleState, SegmentName, SkipReason, WalSegment, classify};
use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedSegment {
    pub segment: WalSegment,
    pub state: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSegment {
    pub name: SegmentName,
    pub reason: SkipReason,
}

/// Output of the retention filter. Every input segment lands in exactly one
/// of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub eligible: Vec<ClassifiedSegment>,
    pub skipped: Vec<SkippedSegment>,
}

impl RetentionPlan {
    pub fn eligible_names(&self) -> Vec<&SegmentName> {
        self.eligible.iter().map(|c| &c.segment.name).collect()
    }
}

pub fn classify_segments(segments: Vec<WalSegment>, active: &SegmentName) -> Vec<ClassifiedSegment> {
    segments
        .into_iter()
        .map(|segment| {
            let state = classify(&segment.name, segment.marker, active);
            ClassifiedSegment { segment, state }
        })
        .collect()
}

/// Promotes `Archived` segments strictly older than `threshold` to
/// `Eligible`; everything else is skipped with its reason. An archived
/// segment whose age is unknown is `Unclassifiable`, never eligible.
pub fn apply_retention(
    classified: Vec<ClassifiedSegment>,
    threshold: RetentionThreshold,
    now: SystemTime,
) -> RetentionPlan {
    let mut plan = RetentionPlan::default();

    for mut entry in classified {
        let reason = match entry.state {
            LifecycleState::Archived => match entry.segment.age(now) {
                Some(age) if threshold.is_exceeded_by(age) => None,
                Some(_) => Some(SkipReason::TooYoung),
                None => Some(SkipReason::Unclassifiable),
            },
            // Only the filter assigns Eligible; anything arriving with it
            // has not been through the age check.
            LifecycleState::Eligible => Some(SkipReason::Unclassifiable),
            other => other.skip_reason(),
        };

        match reason {
            None => {
                entry.state = LifecycleState::Eligible;
                plan.eligible.push(entry);
            }
            Some(reason) => plan.skipped.push(SkippedSegment {
                name: entry.segment.name,
                reason,
            }),
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MarkerState;
    use std::path::PathBuf;
    use std::time::Duration;

    const DAY: u64 = 24 * 3600;

    fn segment(n: u32, marker: MarkerState, age_days: Option<u64>, now: SystemTime) -> WalSegment {
        let name = SegmentName::from_parts(1, 0, n);
        WalSegment {
            path: PathBuf::from(format!("/wal/{}", name)),
            name,
            modified: age_days.map(|d| now - Duration::from_secs(d * DAY)),
            marker,
        }
    }

    #[test]
    fn test_scenario_a() {
        let now = SystemTime::now();
        let seg_a = segment(4, MarkerState::Absent, Some(0), now);
        let seg_b = segment(1, MarkerState::Done, Some(15), now);
        let seg_c = segment(3, MarkerState::Done, Some(3), now);
        let seg_d = segment(2, MarkerState::Ready, Some(20), now);
        let active = seg_a.name.clone();

        let classified = classify_segments(
            vec![seg_a.clone(), seg_b.clone(), seg_c.clone(), seg_d.clone()],
            &active,
        );
        let plan = apply_retention(classified, RetentionThreshold::days(10), now);

        assert_eq!(plan.eligible_names(), vec![&seg_b.name]);
        assert_eq!(plan.eligible[0].state, LifecycleState::Eligible);
        assert_eq!(
            plan.skipped,
            vec![
                SkippedSegment { name: seg_a.name, reason: SkipReason::IsActive },
                SkippedSegment { name: seg_c.name, reason: SkipReason::TooYoung },
                SkippedSegment { name: seg_d.name, reason: SkipReason::NotArchived },
            ]
        );
    }

    #[test]
    fn test_unknown_age_is_skipped() {
        let now = SystemTime::now();
        let seg = segment(1, MarkerState::Done, None, now);
        let active = SegmentName::from_parts(1, 0, 9);

        let plan = apply_retention(
            classify_segments(vec![seg], &active),
            RetentionThreshold::default(),
            now,
        );
        assert!(plan.eligible.is_empty());
        assert_eq!(plan.skipped[0].reason, SkipReason::Unclassifiable);
    }

    #[test]
    fn test_age_equal_to_threshold_is_too_young() {
        let now = SystemTime::now();
        let seg = segment(1, MarkerState::Done, Some(10), now);
        let active = SegmentName::from_parts(1, 0, 9);

        let plan = apply_retention(
            classify_segments(vec![seg], &active),
            RetentionThreshold::days(10),
            now,
        );
        assert_eq!(plan.skipped[0].reason, SkipReason::TooYoung);
    }

    #[test]
    fn test_pre_tagged_eligible_is_not_trusted() {
        let now = SystemTime::now();
        let entry = ClassifiedSegment {
            segment: segment(1, MarkerState::Absent, Some(30), now),
            state: LifecycleState::Eligible,
        };
        let plan = apply_retention(vec![entry], RetentionThreshold::days(10), now);
        assert!(plan.eligible.is_empty());
        assert_eq!(plan.skipped[0].reason, SkipReason::Unclassifiable);
    }
}
