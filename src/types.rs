//! Core types for the Synheart Mock generator
//!
//! This module defines the data structures shared by the write path (sleep
//! architecture, quantity mocks, materialized samples) and the read path
//! (stored intervals and the summaries derived from them).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sleep stage classification used by the generator and the summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake,
    Rem,
    Core,
    Deep,
}

impl SleepStage {
    /// Every stage, in legend order
    pub const ALL: [SleepStage; 4] = [
        SleepStage::Awake,
        SleepStage::Rem,
        SleepStage::Core,
        SleepStage::Deep,
    ];

    /// Whether time in this stage counts as sleep
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepStage::Awake)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "awake",
            SleepStage::Rem => "rem",
            SleepStage::Core => "core",
            SleepStage::Deep => "deep",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SleepStage::Awake => "Awake",
            SleepStage::Rem => "REM",
            SleepStage::Core => "Core",
            SleepStage::Deep => "Deep",
        }
    }

    /// Category code emitted when writing this stage to the store
    pub fn category(&self) -> SleepCategory {
        match self {
            SleepStage::Awake => SleepCategory::Awake,
            SleepStage::Rem => SleepCategory::AsleepRem,
            SleepStage::Core => SleepCategory::AsleepCore,
            SleepStage::Deep => SleepCategory::AsleepDeep,
        }
    }
}

/// Sleep analysis category as stored by the host health store.
///
/// The discriminants are the store's raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepCategory {
    InBed = 0,
    AsleepUnspecified = 1,
    Awake = 2,
    AsleepCore = 3,
    AsleepDeep = 4,
    AsleepRem = 5,
}

impl SleepCategory {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SleepCategory::InBed),
            1 => Some(SleepCategory::AsleepUnspecified),
            2 => Some(SleepCategory::Awake),
            3 => Some(SleepCategory::AsleepCore),
            4 => Some(SleepCategory::AsleepDeep),
            5 => Some(SleepCategory::AsleepRem),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        *self as i64
    }

    /// Stage this category reads back as.
    ///
    /// In-bed collapses to awake and unspecified sleep collapses to core, so
    /// this is not the inverse of [`SleepStage::category`].
    pub fn stage(&self) -> SleepStage {
        match self {
            SleepCategory::InBed | SleepCategory::Awake => SleepStage::Awake,
            SleepCategory::AsleepUnspecified | SleepCategory::AsleepCore => SleepStage::Core,
            SleepCategory::AsleepDeep => SleepStage::Deep,
            SleepCategory::AsleepRem => SleepStage::Rem,
        }
    }
}

/// A contiguous span of one sleep stage, before timestamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSegment {
    pub stage: SleepStage,
    /// Duration in minutes
    pub minutes: f64,
}

impl StageSegment {
    pub fn new(stage: SleepStage, minutes: f64) -> Self {
        Self { stage, minutes }
    }
}

/// Aggregate view of one night of sleep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    /// Merged segments in chronological order
    pub segments: Vec<StageSegment>,
    /// Earliest start across all contributing intervals
    pub start_date: DateTime<Utc>,
    /// Latest end across all contributing intervals
    pub end_date: DateTime<Utc>,
}

impl SleepSummary {
    pub fn total_minutes(&self) -> f64 {
        self.segments.iter().map(|s| s.minutes).sum()
    }

    /// Minutes per stage, summed across non-adjacent occurrences
    pub fn stage_totals(&self) -> BTreeMap<SleepStage, f64> {
        let mut totals = BTreeMap::new();
        for segment in &self.segments {
            *totals.entry(segment.stage).or_insert(0.0) += segment.minutes;
        }
        totals
    }

    pub fn stage_minutes(&self, stage: SleepStage) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.stage == stage)
            .map(|s| s.minutes)
            .sum()
    }

    pub fn asleep_minutes(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.stage.is_asleep())
            .map(|s| s.minutes)
            .sum()
    }

    /// Display percentage for a stage.
    ///
    /// Awake is a share of total time in bed; every other stage is a share of
    /// asleep time. A zero denominator yields 0.
    pub fn percentage(&self, stage: SleepStage) -> f64 {
        let denominator = if stage.is_asleep() {
            self.asleep_minutes()
        } else {
            self.total_minutes()
        };

        if denominator > 0.0 {
            self.stage_minutes(stage) / denominator * 100.0
        } else {
            0.0
        }
    }
}

/// Rounding applied to a drawn quantity before it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// Nearest integer, ties away from zero
    HalfAwayFromZero,
    /// Nearest integer, ties to even.
    ///
    /// Kept distinct from [`RoundingRule::HalfAwayFromZero`] so an exact
    /// `.5` draw rounds toward the even neighbour (2.5 becomes 2).
    Nearest,
}

impl RoundingRule {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundingRule::HalfAwayFromZero => value.round(),
            RoundingRule::Nearest => value.round_ties_even(),
        }
    }
}

/// Static metadata attached to every [`HealthMetric`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSpec {
    pub title: &'static str,
    pub unit: &'static str,
    /// Closed range used for mock generation
    pub range: (f64, f64),
    /// Display ordering rank (lower first)
    pub rank: u8,
    pub rounding: RoundingRule,
}

static SLEEP_SPEC: MetricSpec = MetricSpec {
    title: "Sleep",
    unit: "min",
    range: (360.0, 540.0),
    rank: 0,
    rounding: RoundingRule::Nearest,
};

static DAYLIGHT_SPEC: MetricSpec = MetricSpec {
    title: "Time in Daylight",
    unit: "min",
    range: (20.0, 180.0),
    rank: 1,
    rounding: RoundingRule::HalfAwayFromZero,
};

static STEPS_SPEC: MetricSpec = MetricSpec {
    title: "Steps",
    unit: "count",
    range: (4500.0, 12000.0),
    rank: 2,
    rounding: RoundingRule::Nearest,
};

static WALKING_RUNNING_SPEC: MetricSpec = MetricSpec {
    title: "Walking + Running Distance",
    unit: "m",
    range: (2000.0, 9000.0),
    rank: 3,
    rounding: RoundingRule::Nearest,
};

static CYCLING_SPEC: MetricSpec = MetricSpec {
    title: "Cycling Distance",
    unit: "m",
    range: (3000.0, 25000.0),
    rank: 4,
    rounding: RoundingRule::Nearest,
};

static SWIMMING_SPEC: MetricSpec = MetricSpec {
    title: "Swimming Distance",
    unit: "m",
    range: (200.0, 2000.0),
    rank: 5,
    rounding: RoundingRule::Nearest,
};

static ACTIVE_ENERGY_SPEC: MetricSpec = MetricSpec {
    title: "Active Energy",
    unit: "kcal",
    range: (250.0, 900.0),
    rank: 6,
    rounding: RoundingRule::HalfAwayFromZero,
};

static FLIGHTS_SPEC: MetricSpec = MetricSpec {
    title: "Flights Climbed",
    unit: "count",
    range: (2.0, 25.0),
    rank: 7,
    rounding: RoundingRule::Nearest,
};

/// Health metrics the generator knows how to mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    Sleep,
    TimeInDaylight,
    Steps,
    DistanceWalkingRunning,
    DistanceCycling,
    DistanceSwimming,
    ActiveEnergy,
    FlightsClimbed,
}

impl HealthMetric {
    pub const ALL: [HealthMetric; 8] = [
        HealthMetric::Sleep,
        HealthMetric::TimeInDaylight,
        HealthMetric::Steps,
        HealthMetric::DistanceWalkingRunning,
        HealthMetric::DistanceCycling,
        HealthMetric::DistanceSwimming,
        HealthMetric::ActiveEnergy,
        HealthMetric::FlightsClimbed,
    ];

    pub fn spec(&self) -> &'static MetricSpec {
        match self {
            HealthMetric::Sleep => &SLEEP_SPEC,
            HealthMetric::TimeInDaylight => &DAYLIGHT_SPEC,
            HealthMetric::Steps => &STEPS_SPEC,
            HealthMetric::DistanceWalkingRunning => &WALKING_RUNNING_SPEC,
            HealthMetric::DistanceCycling => &CYCLING_SPEC,
            HealthMetric::DistanceSwimming => &SWIMMING_SPEC,
            HealthMetric::ActiveEnergy => &ACTIVE_ENERGY_SPEC,
            HealthMetric::FlightsClimbed => &FLIGHTS_SPEC,
        }
    }

    pub fn title(&self) -> &'static str {
        self.spec().title
    }

    pub fn unit(&self) -> &'static str {
        self.spec().unit
    }

    /// Sleep is interval based and has no single stored quantity
    pub fn is_quantity(&self) -> bool {
        !matches!(self, HealthMetric::Sleep)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthMetric::Sleep => "sleep",
            HealthMetric::TimeInDaylight => "time_in_daylight",
            HealthMetric::Steps => "steps",
            HealthMetric::DistanceWalkingRunning => "distance_walking_running",
            HealthMetric::DistanceCycling => "distance_cycling",
            HealthMetric::DistanceSwimming => "distance_swimming",
            HealthMetric::ActiveEnergy => "active_energy",
            HealthMetric::FlightsClimbed => "flights_climbed",
        }
    }
}

/// One metric's value for a selected day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricReading {
    pub metric: HealthMetric,
    /// Summed value for quantity metrics, `None` when the day has no data
    pub value: Option<f64>,
    /// Present only for sleep readings with data
    pub sleep_summary: Option<SleepSummary>,
}

/// A materialized sleep record ready to be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSample {
    pub category: SleepCategory,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StageSample {
    pub fn stage(&self) -> SleepStage {
        self.category.stage()
    }

    pub fn minutes(&self) -> f64 {
        duration_minutes(self.start, self.end)
    }
}

/// A sleep record as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStageInterval {
    /// Store category code, possibly one this crate does not know
    pub code: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RawStageInterval {
    pub fn minutes(&self) -> f64 {
        duration_minutes(self.start, self.end)
    }
}

impl From<&StageSample> for RawStageInterval {
    fn from(sample: &StageSample) -> Self {
        Self {
            code: sample.category.code(),
            start: sample.start,
            end: sample.end,
        }
    }
}

/// A single-value mock sample for a quantity metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySample {
    pub metric: HealthMetric,
    pub value: f64,
    pub unit: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Everything generated for one day, persisted all-or-nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    pub batch_id: Uuid,
    pub sleep: Vec<StageSample>,
    pub quantities: Vec<QuantitySample>,
}

impl WriteBatch {
    pub fn len(&self) -> usize {
        self.sleep.len() + self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let micros = (end - start).num_microseconds().unwrap_or(i64::MAX);
    micros as f64 / 60_000_000.0
}
