//! Segment merging
//!
//! Adjacent segments of the same stage collapse into one. Same-stage segments
//! separated by another stage stay distinct.

use crate::types::StageSegment;

/// Append `segment`, extending the last segment when the stage matches.
///
/// Zero-length, negative and non-finite segments are dropped.
pub fn push_merged(segments: &mut Vec<StageSegment>, segment: StageSegment) {
    if !segment.minutes.is_finite() || segment.minutes <= 0.0 {
        return;
    }

    match segments.last_mut() {
        Some(last) if last.stage == segment.stage => last.minutes += segment.minutes,
        _ => segments.push(segment),
    }
}

/// Collapse adjacent same-stage segments, preserving order
pub fn merge_segments(segments: &[StageSegment]) -> Vec<StageSegment> {
    let mut merged = Vec::with_capacity(segments.len());
    for segment in segments {
        push_merged(&mut merged, *segment);
    }
    merged
}
