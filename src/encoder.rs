//! Payload encoding
//!
//! Wraps generated batches and loaded readings in JSON payloads stamped with
//! producer metadata, and renders sleep summaries into the per-stage
//! breakdown the host app displays.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MockError;
use crate::interval::DayWindow;
use crate::types::{HealthMetric, HealthMetricReading, SleepStage, SleepSummary, WriteBatch};
use crate::{MOCK_VERSION, PRODUCER_NAME};

/// Current payload schema version
pub const PAYLOAD_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// A generated day, as handed to the host for writing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub payload_version: String,
    pub producer: Producer,
    pub date: String,
    pub generated_at_utc: String,
    pub batch: WriteBatch,
}

/// Per-stage line of a sleep breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub stage: SleepStage,
    pub minutes: f64,
    pub percentage: f64,
}

/// Display form of a [`SleepSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepView {
    pub start_utc: String,
    pub end_utc: String,
    pub total_minutes: f64,
    pub asleep_minutes: f64,
    pub stages: Vec<StageBreakdown>,
    pub summary: SleepSummary,
}

impl From<&SleepSummary> for SleepView {
    fn from(summary: &SleepSummary) -> Self {
        let stages = SleepStage::ALL
            .iter()
            .map(|&stage| StageBreakdown {
                stage,
                minutes: summary.stage_minutes(stage),
                percentage: summary.percentage(stage),
            })
            .collect();

        Self {
            start_utc: summary.start_date.to_rfc3339(),
            end_utc: summary.end_date.to_rfc3339(),
            total_minutes: summary.total_minutes(),
            asleep_minutes: summary.asleep_minutes(),
            stages,
            summary: summary.clone(),
        }
    }
}

/// One metric card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingView {
    pub metric: HealthMetric,
    pub title: String,
    pub unit: String,
    pub value: Option<f64>,
    pub sleep: Option<SleepView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingsPayload {
    pub payload_version: String,
    pub producer: Producer,
    pub date: String,
    pub readings: Vec<ReadingView>,
}

/// Encoder carrying a stable producer instance id
pub struct MockEncoder {
    instance_id: String,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: MOCK_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    pub fn encode_batch(&self, window: &DayWindow, batch: &WriteBatch) -> BatchPayload {
        BatchPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: self.producer(),
            date: window.date.format("%Y-%m-%d").to_string(),
            generated_at_utc: Utc::now().to_rfc3339(),
            batch: batch.clone(),
        }
    }

    pub fn encode_batch_to_json(
        &self,
        window: &DayWindow,
        batch: &WriteBatch,
    ) -> Result<String, MockError> {
        Ok(serde_json::to_string(&self.encode_batch(window, batch))?)
    }

    pub fn encode_readings(
        &self,
        window: &DayWindow,
        readings: &[HealthMetricReading],
    ) -> ReadingsPayload {
        let readings = readings
            .iter()
            .map(|reading| ReadingView {
                metric: reading.metric,
                title: reading.metric.title().to_string(),
                unit: reading.metric.unit().to_string(),
                value: reading.value,
                sleep: reading.sleep_summary.as_ref().map(SleepView::from),
            })
            .collect();

        ReadingsPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: self.producer(),
            date: window.date.format("%Y-%m-%d").to_string(),
            readings,
        }
    }

    pub fn encode_readings_to_json(
        &self,
        window: &DayWindow,
        readings: &[HealthMetricReading],
    ) -> Result<String, MockError> {
        Ok(serde_json::to_string(&self.encode_readings(window, readings))?)
    }
}
