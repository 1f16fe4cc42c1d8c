//! Quantity metric mocks
//!
//! Every non-sleep metric gets a single sample per day: a bounded uniform
//! draw, rounded per metric, placed at a random time inside the day window.

use rand::Rng;
use tracing::debug;

use crate::config::MockConfig;
use crate::interval::{duration_from_seconds, DayWindow};
use crate::types::{HealthMetric, QuantitySample};

/// Sample start offset into the day, in seconds
const START_OFFSET_SECONDS: (f64, f64) = (3_600.0, 57_600.0);
/// Sample duration, in seconds
const DURATION_SECONDS: (f64, f64) = (1_200.0, 5_400.0);

/// Draw one sample for `metric` from the closed `range`.
///
/// Returns `None` for sleep, for an unusable range, and when the draw is not
/// positive.
pub fn generate_quantity<R: Rng + ?Sized>(
    metric: HealthMetric,
    window: &DayWindow,
    range: (f64, f64),
    rng: &mut R,
) -> Option<QuantitySample> {
    if !metric.is_quantity() {
        return None;
    }

    let (low, high) = range;
    if !low.is_finite() || !high.is_finite() || low > high {
        debug!(metric = metric.as_str(), low, high, "skipping unusable range");
        return None;
    }

    let drawn = rng.gen_range(low..=high);
    if drawn <= 0.0 {
        debug!(metric = metric.as_str(), drawn, "dropping non-positive draw");
        return None;
    }
    let value = metric.spec().rounding.apply(drawn);

    let offset = rng.gen_range(START_OFFSET_SECONDS.0..=START_OFFSET_SECONDS.1);
    let length = rng.gen_range(DURATION_SECONDS.0..=DURATION_SECONDS.1);
    let start = window.start + duration_from_seconds(offset);
    let end = (start + duration_from_seconds(length)).min(window.end);

    Some(QuantitySample {
        metric,
        value,
        unit: metric.unit().to_string(),
        start,
        end,
    })
}

/// One sample per quantity metric, using the configured ranges
pub fn generate_quantities<R: Rng + ?Sized>(
    window: &DayWindow,
    config: &MockConfig,
    rng: &mut R,
) -> Vec<QuantitySample> {
    HealthMetric::ALL
        .iter()
        .filter(|metric| metric.is_quantity())
        .filter_map(|&metric| generate_quantity(metric, window, config.range_for(metric), rng))
        .collect()
}
