//! Sleep summary aggregation
//!
//! The read-side inverse of generation: stored stage intervals are filtered,
//! ordered and folded back into merged segments plus the overall time range.

use tracing::debug;

use crate::sleep::merge::push_merged;
use crate::types::{RawStageInterval, SleepCategory, SleepSummary, StageSegment};

/// Summarize stored sleep intervals.
///
/// Intervals with a non-positive duration or an unknown category code are
/// skipped. Returns `None` when nothing survives, which is the normal
/// "no data" result for a night without records.
pub fn summarize(intervals: &[RawStageInterval]) -> Option<SleepSummary> {
    let mut kept: Vec<(&RawStageInterval, SleepCategory)> = intervals
        .iter()
        .filter(|interval| interval.end > interval.start)
        .filter_map(|interval| SleepCategory::from_code(interval.code).map(|c| (interval, c)))
        .collect();

    let dropped = intervals.len() - kept.len();
    if dropped > 0 {
        debug!(dropped, kept = kept.len(), "skipped unusable sleep intervals");
    }

    // stable, so equal starts keep store order
    kept.sort_by_key(|(interval, _)| interval.start);

    let (first, _) = kept.first()?;
    let mut start_date = first.start;
    let mut end_date = first.end;
    let mut segments = Vec::new();

    for (interval, category) in &kept {
        start_date = start_date.min(interval.start);
        end_date = end_date.max(interval.end);
        push_merged(
            &mut segments,
            StageSegment::new(category.stage(), interval.minutes()),
        );
    }

    Some(SleepSummary {
        segments,
        start_date,
        end_date,
    })
}
