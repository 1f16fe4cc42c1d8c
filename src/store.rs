//! Health store boundary
//!
//! The generator never talks to the platform store directly. It produces a
//! [`WriteBatch`] and consumes query results through the [`HealthStore`]
//! trait, so the host app can plug in the real store and tests can use
//! [`InMemoryStore`].

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::MockError;
use crate::interval::DayWindow;
use crate::types::{HealthMetric, QuantitySample, RawStageInterval, StageSample, WriteBatch};

/// Operations the mock generator needs from a health data store
pub trait HealthStore {
    /// Ask for read/write access to every supported metric
    fn request_authorization(&mut self) -> Result<(), MockError>;

    /// Sum of a quantity metric over the window, `None` if nothing was recorded
    fn query_sum(&self, metric: HealthMetric, window: &DayWindow)
        -> Result<Option<f64>, MockError>;

    /// Raw sleep intervals overlapping `[start, end)`
    fn query_sleep(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawStageInterval>, MockError>;

    /// Persist the whole batch or nothing
    fn write(&mut self, batch: &WriteBatch) -> Result<(), MockError>;
}

/// Store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    authorized: bool,
    deny_authorization: bool,
    fail_writes: bool,
    sleep: Vec<RawStageInterval>,
    quantities: Vec<QuantitySample>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses authorization requests
    pub fn denying_authorization() -> Self {
        Self {
            deny_authorization: true,
            ..Self::default()
        }
    }

    /// A store whose writes always fail
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Seed raw sleep records, e.g. ones written by another app
    pub fn insert_sleep(&mut self, intervals: impl IntoIterator<Item = RawStageInterval>) {
        self.sleep.extend(intervals);
    }

    pub fn sleep_records(&self) -> &[RawStageInterval] {
        &self.sleep
    }

    pub fn quantity_records(&self) -> &[QuantitySample] {
        &self.quantities
    }

    fn ensure_authorized(&self) -> Result<(), MockError> {
        if self.authorized {
            Ok(())
        } else {
            Err(MockError::Unauthorized)
        }
    }
}

impl HealthStore for InMemoryStore {
    fn request_authorization(&mut self) -> Result<(), MockError> {
        if self.deny_authorization {
            warn!("health store authorization denied");
            return Err(MockError::StoreError("authorization denied".to_string()));
        }
        self.authorized = true;
        Ok(())
    }

    fn query_sum(
        &self,
        metric: HealthMetric,
        window: &DayWindow,
    ) -> Result<Option<f64>, MockError> {
        self.ensure_authorized()?;

        let values: Vec<f64> = self
            .quantities
            .iter()
            .filter(|q| q.metric == metric && window.contains(q.start))
            .map(|q| q.value)
            .collect();

        if values.is_empty() {
            Ok(None)
        } else {
            Ok(Some(values.iter().sum()))
        }
    }

    fn query_sleep(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawStageInterval>, MockError> {
        self.ensure_authorized()?;

        Ok(self
            .sleep
            .iter()
            .filter(|interval| interval.start < end && interval.end > start)
            .cloned()
            .collect())
    }

    fn write(&mut self, batch: &WriteBatch) -> Result<(), MockError> {
        self.ensure_authorized()?;

        if self.fail_writes {
            return Err(MockError::StoreError("store unavailable".to_string()));
        }

        let malformed_sleep = batch.sleep.iter().any(|s: &StageSample| s.end < s.start);
        let malformed_quantity = batch
            .quantities
            .iter()
            .any(|q| q.end < q.start || !q.value.is_finite());
        if malformed_sleep || malformed_quantity {
            return Err(MockError::StoreError(format!(
                "batch {} contains malformed samples",
                batch.batch_id
            )));
        }

        self.sleep.extend(batch.sleep.iter().map(RawStageInterval::from));
        self.quantities.extend(batch.quantities.iter().cloned());

        info!(
            batch_id = %batch.batch_id,
            samples = batch.len(),
            "wrote mock batch"
        );
        Ok(())
    }
}
