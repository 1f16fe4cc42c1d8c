//! Sample materialization
//!
//! Turns an ordered list of relative stage durations into contiguous,
//! absolute-time sleep samples.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use crate::error::MockError;
use crate::interval::{duration_from_minutes, duration_from_seconds, DayWindow};
use crate::sleep::architecture::generate_architecture;
use crate::sleep::merge::merge_segments;
use crate::types::{StageSample, StageSegment};

/// Bedtime offset before the day window start, in seconds
const BEDTIME_OFFSET_SECONDS: (f64, f64) = (7_200.0, 12_600.0);

/// Assign timestamps to `segments` starting at `anchor`.
///
/// Boundaries come from the cumulative offset so `sample[i].end` is exactly
/// `sample[i + 1].start`. Segments too short to survive microsecond precision
/// are folded into the next sample, and a sample that would repeat the stage
/// of the one before it extends that sample instead.
pub fn materialize(
    segments: &[StageSegment],
    anchor: DateTime<Utc>,
) -> Result<Vec<StageSample>, MockError> {
    let mut samples: Vec<StageSample> = Vec::with_capacity(segments.len());
    let mut elapsed_minutes = 0.0;
    let mut cursor = anchor;

    for segment in segments {
        if !segment.minutes.is_finite() || segment.minutes <= 0.0 {
            continue;
        }

        elapsed_minutes += segment.minutes;
        let end = anchor
            .checked_add_signed(duration_from_minutes(elapsed_minutes))
            .ok_or_else(|| {
                MockError::InvalidInput(format!(
                    "{elapsed_minutes} minutes after {anchor} is out of range"
                ))
            })?;
        if end <= cursor {
            continue;
        }

        let category = segment.stage.category();
        match samples.last_mut() {
            Some(last) if last.category == category && last.end == cursor => last.end = end,
            _ => samples.push(StageSample {
                category,
                start: cursor,
                end,
            }),
        }
        cursor = end;
    }

    Ok(samples)
}

/// Sleep onset for the night leading into `window`, 2 to 3.5 hours before it starts
pub fn sleep_anchor<R: Rng + ?Sized>(
    window: &DayWindow,
    rng: &mut R,
) -> Result<DateTime<Utc>, MockError> {
    let offset = rng.gen_range(BEDTIME_OFFSET_SECONDS.0..BEDTIME_OFFSET_SECONDS.1);
    window
        .start
        .checked_sub_signed(duration_from_seconds(offset))
        .ok_or_else(|| {
            MockError::InvalidInput(format!("no bedtime precedes {}", window.start))
        })
}

/// Generate, merge and timestamp one night of sleep ending in `window`
pub fn generate_night<R: Rng + ?Sized>(
    window: &DayWindow,
    total_minutes: f64,
    rng: &mut R,
) -> Result<Vec<StageSample>, MockError> {
    let segments = merge_segments(&generate_architecture(total_minutes, rng)?);
    let anchor = sleep_anchor(window, rng)?;
    let samples = materialize(&segments, anchor)?;

    debug!(
        date = %window.date,
        anchor = %anchor,
        samples = samples.len(),
        "materialized sleep night"
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleep::summary::summarize;
    use crate::types::{RawStageInterval, SleepCategory, SleepStage};
    use chrono::{Duration, NaiveDate, TimeZone};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn window() -> DayWindow {
        DayWindow::for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), &Utc).unwrap()
    }

    #[test]
    fn test_materialize_is_contiguous() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        let samples = materialize(
            &[
                StageSegment::new(SleepStage::Core, 30.0),
                StageSegment::new(SleepStage::Deep, 22.5),
                StageSegment::new(SleepStage::Awake, 0.0),
                StageSegment::new(SleepStage::Rem, 10.0),
            ],
            anchor,
        )
        .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].start, anchor);
        assert_eq!(samples[0].end, anchor + Duration::minutes(30));
        assert_eq!(samples[1].category, SleepCategory::AsleepDeep);
        assert_eq!(samples[1].end, anchor + Duration::seconds(52 * 60 + 30));
        assert_eq!(samples[2].category, SleepCategory::AsleepRem);
        assert!(samples.windows(2).all(|pair| pair[0].end == pair[1].start));
    }

    #[test]
    fn test_materialize_empty() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        assert!(materialize(&[], anchor).unwrap().is_empty());
    }

    #[test]
    fn test_anchor_precedes_midnight() {
        let window = window();
        for seed in 0..100 {
            let anchor = sleep_anchor(&window, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
            let lead = window.start - anchor;
            assert!(lead >= Duration::seconds(7_200), "{lead}");
            assert!(lead < Duration::seconds(12_600), "{lead}");
        }
    }

    #[test]
    fn test_generated_night_shape() {
        let window = window();
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = generate_night(&window, 480.0, &mut rng).unwrap();

            assert_eq!(samples[0].stage(), SleepStage::Core);
            assert_eq!(samples.last().unwrap().stage(), SleepStage::Awake);
            assert!(samples.windows(2).all(|pair| pair[0].end == pair[1].start));
            assert!(samples.windows(2).all(|pair| pair[0].stage() != pair[1].stage()));

            let total: f64 = samples.iter().map(|s| s.minutes()).sum();
            assert!((total - 480.0).abs() < 1e-6, "{total}");

            let span = samples.last().unwrap().end - samples[0].start;
            assert_eq!(span, Duration::minutes(480));
        }
    }

    #[test]
    fn test_round_trip_preserves_stage_totals() {
        let window = window();
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let segments = merge_segments(&generate_architecture(455.0, &mut rng).unwrap());
            let anchor = sleep_anchor(&window, &mut rng).unwrap();
            let samples = materialize(&segments, anchor).unwrap();

            let intervals: Vec<RawStageInterval> =
                samples.iter().map(RawStageInterval::from).collect();
            let summary = summarize(&intervals).expect("generated night has data");

            let mut expected = std::collections::BTreeMap::new();
            for segment in &segments {
                *expected.entry(segment.stage).or_insert(0.0) += segment.minutes;
            }

            let actual = summary.stage_totals();
            assert_eq!(
                actual.keys().collect::<Vec<_>>(),
                expected.keys().collect::<Vec<_>>()
            );
            for (stage, minutes) in expected {
                assert!((actual[&stage] - minutes).abs() < 1e-6, "{stage:?}");
            }
            assert_eq!(summary.start_date, anchor);
        }
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            generate_night(&window(), 0.0, &mut rng),
            Err(MockError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sub_microsecond_gap_does_not_split_a_stage() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        let samples = materialize(
            &[
                StageSegment::new(SleepStage::Core, 30.0),
                StageSegment::new(SleepStage::Deep, 1e-9),
                StageSegment::new(SleepStage::Core, 10.0),
                StageSegment::new(SleepStage::Rem, 5.0),
            ],
            anchor,
        )
        .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].category, SleepCategory::AsleepCore);
        assert_eq!(samples[0].start, anchor);
        assert_eq!(samples[0].end, anchor + Duration::minutes(40));
        assert_eq!(samples[1].category, SleepCategory::AsleepRem);
        assert_eq!(samples[1].start, samples[0].end);
    }

    #[test]
    fn test_out_of_range_timestamps_are_errors() {
        let late = DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        assert!(matches!(
            materialize(&[StageSegment::new(SleepStage::Core, 120.0)], late),
            Err(MockError::InvalidInput(_))
        ));

        let huge = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        assert!(matches!(
            materialize(&[StageSegment::new(SleepStage::Core, 1e12)], huge),
            Err(MockError::InvalidInput(_))
        ));

        let earliest = DayWindow {
            date: DateTime::<Utc>::MIN_UTC.date_naive(),
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MIN_UTC + Duration::days(1),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(matches!(
            sleep_anchor(&earliest, &mut rng),
            Err(MockError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_huge_night_is_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            generate_night(&window(), 1e12, &mut rng),
            Err(MockError::InvalidInput(_))
        ));
    }
}
