//! Read/write cycle orchestration
//!
//! This module provides the stateful entry point the host app drives:
//! authorize once, then load readings for a day or generate and write a
//! day's worth of mock samples.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Builder;

use crate::config::{MockConfig, MAX_SLEEP_MINUTES};
use crate::error::MockError;
use crate::interval::DayWindow;
use crate::metrics::generate_quantities;
use crate::sleep::{generate_night, summarize};
use crate::store::HealthStore;
use crate::types::{HealthMetric, HealthMetricReading, WriteBatch};

/// Where the session is in its read/write cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthorized,
    Idle,
    Loading,
    Generating,
}

/// Build everything to be written for `window` without touching a store
pub fn build_batch<R: Rng + ?Sized>(
    window: &DayWindow,
    config: &MockConfig,
    rng: &mut R,
) -> Result<WriteBatch, MockError> {
    let (low, high) = config.range_for(HealthMetric::Sleep);
    if !(low > 0.0 && low <= high && high <= MAX_SLEEP_MINUTES) {
        return Err(MockError::InvalidConfig(format!(
            "sleep duration range {low}..={high} is unusable"
        )));
    }

    let batch_id = Builder::from_random_bytes(rng.gen()).into_uuid();
    let sleep_minutes = rng.gen_range(low..=high);
    let sleep = generate_night(window, sleep_minutes, rng)?;
    let quantities = generate_quantities(window, config, rng);

    Ok(WriteBatch {
        batch_id,
        sleep,
        quantities,
    })
}

/// Stateful processor over a [`HealthStore`]
pub struct MockProcessor<S> {
    store: S,
    config: MockConfig,
    rng: ChaCha8Rng,
    state: SessionState,
}

impl<S: HealthStore> MockProcessor<S> {
    /// Create a processor; the RNG is seeded from the config when it pins a seed
    pub fn new(store: S, config: MockConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            store,
            config,
            rng,
            state: SessionState::Unauthorized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Request store access; repeat calls after success are no-ops
    pub fn authorize(&mut self) -> Result<(), MockError> {
        if self.state != SessionState::Unauthorized {
            return Ok(());
        }

        self.store.request_authorization()?;
        self.state = SessionState::Idle;
        info!("health store authorized");
        Ok(())
    }

    /// Generate one day of mock data and write it as a single batch.
    ///
    /// Nothing is written when generation fails, and a failed write is
    /// reported without retrying.
    pub fn generate_day(&mut self, window: &DayWindow) -> Result<WriteBatch, MockError> {
        self.enter(SessionState::Generating)?;

        let result = build_batch(window, &self.config, &mut self.rng).and_then(|batch| {
            self.store.write(&batch)?;
            Ok(batch)
        });
        self.state = SessionState::Idle;

        match &result {
            Ok(batch) => info!(
                date = %window.date,
                batch_id = %batch.batch_id,
                sleep_samples = batch.sleep.len(),
                quantity_samples = batch.quantities.len(),
                "generated mock day"
            ),
            Err(e) => warn!(date = %window.date, error = %e, "mock generation failed"),
        }
        result
    }

    /// Read back every metric for the day, ordered by display rank
    pub fn load_day(&mut self, window: &DayWindow) -> Result<Vec<HealthMetricReading>, MockError> {
        self.enter(SessionState::Loading)?;
        let result = self.read_readings(window);
        self.state = SessionState::Idle;

        if let Err(e) = &result {
            warn!(date = %window.date, error = %e, "loading readings failed");
        }
        result
    }

    fn read_readings(&self, window: &DayWindow) -> Result<Vec<HealthMetricReading>, MockError> {
        let mut metrics = HealthMetric::ALL;
        metrics.sort_by_key(|m| m.spec().rank);

        let mut readings = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let reading = if metric.is_quantity() {
                HealthMetricReading {
                    metric,
                    value: self.store.query_sum(metric, window)?,
                    sleep_summary: None,
                }
            } else {
                let (start, end) = window.sleep_window();
                let intervals = self.store.query_sleep(start, end)?;
                HealthMetricReading {
                    metric,
                    value: None,
                    sleep_summary: summarize(&intervals),
                }
            };
            readings.push(reading);
        }

        Ok(readings)
    }

    fn enter(&mut self, next: SessionState) -> Result<(), MockError> {
        if self.state == SessionState::Unauthorized {
            return Err(MockError::Unauthorized);
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::SleepStage;
    use chrono::{NaiveDate, Utc};

    fn window() -> DayWindow {
        DayWindow::for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), &Utc).unwrap()
    }

    fn seeded(store: InMemoryStore) -> MockProcessor<InMemoryStore> {
        MockProcessor::new(
            store,
            MockConfig {
                seed: Some(42),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_generation_requires_authorization() {
        let mut processor = seeded(InMemoryStore::new());
        assert_eq!(processor.state(), SessionState::Unauthorized);
        assert!(matches!(
            processor.generate_day(&window()),
            Err(MockError::Unauthorized)
        ));
        assert!(matches!(processor.load_day(&window()), Err(MockError::Unauthorized)));
    }

    #[test]
    fn test_denied_authorization_stays_unauthorized() {
        let mut processor = seeded(InMemoryStore::denying_authorization());
        assert!(processor.authorize().is_err());
        assert_eq!(processor.state(), SessionState::Unauthorized);
    }

    #[test]
    fn test_generate_then_load_round_trip() {
        let mut processor = seeded(InMemoryStore::new());
        processor.authorize().unwrap();
        let window = window();

        let batch = processor.generate_day(&window).unwrap();
        assert_eq!(processor.state(), SessionState::Idle);
        assert_eq!(batch.quantities.len(), 7);

        let readings = processor.load_day(&window).unwrap();
        assert_eq!(readings.len(), 8);
        assert_eq!(readings[0].metric, HealthMetric::Sleep);

        let summary = readings[0].sleep_summary.as_ref().expect("sleep was written");
        let written: f64 = batch.sleep.iter().map(|s| s.minutes()).sum();
        assert!((summary.total_minutes() - written).abs() < 1e-6);
        assert!(summary.total_minutes() >= 360.0 - 1e-6);
        assert!(summary.total_minutes() <= 540.0 + 1e-6);
        assert_eq!(summary.segments.last().unwrap().stage, SleepStage::Awake);

        for reading in &readings[1..] {
            let sample = batch
                .quantities
                .iter()
                .find(|q| q.metric == reading.metric)
                .unwrap();
            assert_eq!(reading.value, Some(sample.value));
            assert!(reading.sleep_summary.is_none());
        }
    }

    #[test]
    fn test_load_without_data_is_empty_not_error() {
        let mut processor = seeded(InMemoryStore::new());
        processor.authorize().unwrap();

        let readings = processor.load_day(&window()).unwrap();
        assert!(readings.iter().all(|r| r.value.is_none() && r.sleep_summary.is_none()));
    }

    #[test]
    fn test_failed_write_leaves_store_untouched() {
        let mut processor = seeded(InMemoryStore::failing_writes());
        processor.authorize().unwrap();

        assert!(matches!(
            processor.generate_day(&window()),
            Err(MockError::StoreError(_))
        ));
        assert_eq!(processor.state(), SessionState::Idle);

        let store = processor.into_store();
        assert!(store.sleep_records().is_empty());
        assert!(store.quantity_records().is_empty());
    }

    #[test]
    fn test_seeded_batches_are_reproducible() {
        let config = MockConfig {
            seed: Some(9),
            ..Default::default()
        };
        let a = build_batch(&window(), &config, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = build_batch(&window(), &config, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
        assert!(!a.batch_id.is_nil());
    }

    #[test]
    fn test_rejects_unusable_sleep_range() {
        let config = MockConfig {
            ranges: vec![crate::config::RangeOverride {
                metric: HealthMetric::Sleep,
                low: -1.0,
                high: 10.0,
            }],
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            build_batch(&window(), &config, &mut rng),
            Err(MockError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_sleep_range_too_long_to_timestamp() {
        let config = MockConfig {
            ranges: vec![crate::config::RangeOverride {
                metric: HealthMetric::Sleep,
                low: 1e12,
                high: 1e12,
            }],
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            build_batch(&window(), &config, &mut rng),
            Err(MockError::InvalidConfig(_))
        ));
    }
}
