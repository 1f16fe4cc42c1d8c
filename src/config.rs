//! Generator configuration
//!
//! Defaults come from the static metric table; a JSON document can pin the
//! RNG seed and override individual metric ranges.

use serde::{Deserialize, Serialize};

use crate::error::MockError;
use crate::types::HealthMetric;

/// Longest night, in minutes, a sleep range may ask for
pub const MAX_SLEEP_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Replacement generation range for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeOverride {
    pub metric: HealthMetric,
    pub low: f64,
    pub high: f64,
}

/// Mock generation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Seed for reproducible runs; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Per-metric range overrides, later entries win
    pub ranges: Vec<RangeOverride>,
}

impl MockConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, MockError> {
        let config: MockConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, MockError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MockError> {
        for range in &self.ranges {
            let name = range.metric.as_str();
            if !range.low.is_finite() || !range.high.is_finite() {
                return Err(MockError::InvalidConfig(format!(
                    "{name}: range bounds must be finite"
                )));
            }
            if range.low > range.high {
                return Err(MockError::InvalidConfig(format!(
                    "{name}: low {} exceeds high {}",
                    range.low, range.high
                )));
            }
            if range.metric == HealthMetric::Sleep && range.low <= 0.0 {
                return Err(MockError::InvalidConfig(
                    "sleep: duration range must be positive".to_string(),
                ));
            }
            if range.metric == HealthMetric::Sleep && range.high > MAX_SLEEP_MINUTES {
                return Err(MockError::InvalidConfig(format!(
                    "sleep: duration {} exceeds {MAX_SLEEP_MINUTES} minutes",
                    range.high
                )));
            }
        }
        Ok(())
    }

    /// Effective generation range for `metric`
    pub fn range_for(&self, metric: HealthMetric) -> (f64, f64) {
        self.ranges
            .iter()
            .rev()
            .find(|r| r.metric == metric)
            .map(|r| (r.low, r.high))
            .unwrap_or(metric.spec().range)
    }
}
