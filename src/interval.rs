//! Day window resolution
//!
//! Maps a calendar date in the user's timezone onto the half-open UTC window
//! `[start_of_day, start_of_next_day)` that mock samples must fall inside.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MockError;

/// Half-open calendar-day window in absolute time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Resolve the window for `date` in timezone `tz`.
    ///
    /// Local midnights skipped by a DST transition resolve to the earliest
    /// valid instant of that day; a day whose start cannot be resolved at all
    /// is rejected.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<Self, MockError> {
        let next = date
            .succ_opt()
            .ok_or_else(|| MockError::InvalidInput(format!("no day follows {date}")))?;

        let start = local_start_of_day(date, tz)?;
        let end = local_start_of_day(next, tz)?;

        Ok(Self { date, start, end })
    }

    /// Resolve a `YYYY-MM-DD` date string
    pub fn parse_date(date: &str) -> Result<NaiveDate, MockError> {
        NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| MockError::DateParseError(format!("{date}: {e}")))
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Window used to read back the night of sleep belonging to this day.
    ///
    /// Runs noon to noon so that a bedtime on the previous evening is captured.
    pub fn sleep_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let half_day = Duration::hours(12);
        (self.start - half_day, self.start + half_day)
    }
}

/// Convert fractional seconds to a duration at microsecond precision
pub fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::microseconds((seconds * 1_000_000.0).round() as i64)
}

/// Convert fractional minutes to a duration at microsecond precision
pub fn duration_from_minutes(minutes: f64) -> Duration {
    duration_from_seconds(minutes * 60.0)
}

fn local_start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, MockError> {
    // Probe forward in 30 minute steps to get past a DST gap at midnight.
    for step in 0..=4 {
        let Some(local) = date.and_hms_opt(0, 0, 0).map(|t| t + Duration::minutes(30 * step)) else {
            break;
        };
        if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
            return Ok(resolved.with_timezone(&Utc));
        }
    }

    Err(MockError::InvalidInput(format!(
        "start of day {date} does not exist in the requested timezone"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_utc_window() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let window = DayWindow::for_date(date, &Utc).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap());
        assert_eq!(window.duration(), Duration::days(1));
    }

    #[test]
    fn test_offset_window() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = DayWindow::for_date(date, &est).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 16, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_window_is_half_open() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = DayWindow::for_date(date, &Utc).unwrap();

        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
        assert!(window.contains(window.end - Duration::seconds(1)));
    }

    #[test]
    fn test_sleep_window_spans_previous_evening() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let window = DayWindow::for_date(date, &Utc).unwrap();
        let (start, end) = window.sleep_window();

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 14, 12, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_fractional_durations() {
        assert_eq!(duration_from_seconds(1.5), Duration::milliseconds(1500));
        assert_eq!(duration_from_minutes(2.25), Duration::seconds(135));
        assert_eq!(duration_from_minutes(0.0), Duration::zero());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            DayWindow::parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(matches!(
            DayWindow::parse_date("15/01/2024"),
            Err(MockError::DateParseError(_))
        ));
    }
}
