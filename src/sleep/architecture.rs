//! Synthetic sleep architecture
//!
//! Builds a night out of 3 to 5 roughly 90 minute cycles. Early cycles carry
//! more deep sleep, late cycles more REM. Each cycle is emitted as
//! `Core -> Deep -> Core -> REM [-> Awake]`, the night ends on a terminal
//! wake-up, and the whole sequence is rescaled to hit the requested total.

use rand::Rng;
use tracing::debug;

use crate::error::MockError;
use crate::types::{SleepStage, StageSegment};

const CYCLE_MINUTES: f64 = 90.0;
const MIN_CYCLES: i64 = 3;
const MAX_CYCLES: i64 = 5;

const DEEP_JITTER: (f64, f64) = (0.85, 1.10);
const REM_JITTER: (f64, f64) = (0.90, 1.15);
const AWAKE_JITTER: (f64, f64) = (0.60, 1.30);

const MIN_DEEP_MINUTES: f64 = 6.0;
const MIN_REM_MINUTES: f64 = 6.0;
const MIN_AWAKE_MINUTES: f64 = 2.0;
const MIN_CORE_MINUTES: f64 = 12.0;
const AWAKE_FALLBACK_FLOOR: f64 = 1.0;

/// Share of core emitted before the deep block
const FIRST_CORE_SHARE: f64 = 0.45;

const TERMINAL_WAKE_MINUTES: (f64, f64) = (4.0, 12.0);

/// Number of cycles for a night of `total_minutes`
pub fn cycle_count(total_minutes: f64) -> usize {
    let raw = (total_minutes / CYCLE_MINUTES).round() as i64;
    raw.clamp(MIN_CYCLES, MAX_CYCLES) as usize
}

/// Generate an ordered stage sequence summing to `total_minutes`
pub fn generate_architecture<R: Rng + ?Sized>(
    total_minutes: f64,
    rng: &mut R,
) -> Result<Vec<StageSegment>, MockError> {
    if !total_minutes.is_finite() || total_minutes <= 0.0 {
        return Err(MockError::InvalidInput(format!(
            "sleep duration must be positive, got {total_minutes}"
        )));
    }

    let cycles = cycle_count(total_minutes);
    let cycle_length = total_minutes / cycles as f64;
    let mut segments = Vec::with_capacity(cycles * 5 + 1);

    for index in 0..cycles {
        let progress = index as f64 / (cycles - 1).max(1) as f64;
        let plan = CyclePlan::draw(cycle_length, progress, rng);
        let is_last = index + 1 == cycles;

        let first_core = plan.core * FIRST_CORE_SHARE;
        segments.push(StageSegment::new(SleepStage::Core, first_core));
        segments.push(StageSegment::new(SleepStage::Deep, plan.deep));
        segments.push(StageSegment::new(SleepStage::Core, plan.core - first_core));
        segments.push(StageSegment::new(SleepStage::Rem, plan.rem));

        if !is_last || rng.gen_bool(0.5) {
            segments.push(StageSegment::new(SleepStage::Awake, plan.awake));
        }
    }

    let terminal_wake = rng.gen_range(TERMINAL_WAKE_MINUTES.0..TERMINAL_WAKE_MINUTES.1);
    segments.push(StageSegment::new(SleepStage::Awake, terminal_wake));

    let drafted: f64 = segments.iter().map(|s| s.minutes).sum();
    let scale = total_minutes / drafted;
    for segment in &mut segments {
        segment.minutes *= scale;
    }

    debug!(
        total_minutes,
        cycles,
        segments = segments.len(),
        scale,
        "generated sleep architecture"
    );

    Ok(segments)
}

/// Stage minutes for one cycle before rescaling
#[derive(Debug, Clone, Copy, PartialEq)]
struct CyclePlan {
    core: f64,
    deep: f64,
    rem: f64,
    awake: f64,
}

impl CyclePlan {
    fn draw<R: Rng + ?Sized>(cycle_length: f64, progress: f64, rng: &mut R) -> Self {
        let deep_share = (0.24 - 0.10 * progress).max(0.10);
        let rem_share = (0.12 + 0.12 * progress).min(0.30);
        let awake_share = 0.03;

        let deep = (cycle_length * deep_share * jitter(rng, DEEP_JITTER)).max(MIN_DEEP_MINUTES);
        let rem = (cycle_length * rem_share * jitter(rng, REM_JITTER)).max(MIN_REM_MINUTES);
        let awake =
            (cycle_length * awake_share * jitter(rng, AWAKE_JITTER)).max(MIN_AWAKE_MINUTES);

        Self::balance(cycle_length, deep, rem, awake)
    }

    /// Fill the cycle with core, keeping at least the core floor.
    ///
    /// A core deficit is taken from deep and REM in proportion to their size.
    /// Awake only absorbs it when deep and REM are both empty.
    fn balance(cycle_length: f64, mut deep: f64, mut rem: f64, mut awake: f64) -> Self {
        let mut core = cycle_length - deep - rem - awake;

        if core < MIN_CORE_MINUTES {
            let deficit = MIN_CORE_MINUTES - core;
            core = MIN_CORE_MINUTES;

            let pool = deep + rem;
            if pool > 0.0 {
                deep = (deep - deficit * deep / pool).max(0.0);
                rem = (rem - deficit * rem / pool).max(0.0);
            } else {
                awake = (awake - deficit).max(AWAKE_FALLBACK_FLOOR);
            }
        }

        Self {
            core,
            deep,
            rem,
            awake,
        }
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, band: (f64, f64)) -> f64 {
    rng.gen_range(band.0..band.1)
}
