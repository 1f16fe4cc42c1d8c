//! FFI bindings for Synheart Mock
//!
//! This module provides C-compatible functions for calling Mock from the host
//! app. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `mock_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::FixedOffset;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::MockConfig;
use crate::encoder::{MockEncoder, SleepView};
use crate::error::MockError;
use crate::interval::DayWindow;
use crate::processor::build_batch;
use crate::sleep::summarize;
use crate::types::{HealthMetric, MetricSpec, RawStageInterval};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Report a result across the boundary: JSON string or NULL plus last error
fn finish(result: Result<String, MockError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn generate_day(
    date: &str,
    utc_offset_seconds: i32,
    seed: i64,
    config: MockConfig,
) -> Result<String, MockError> {
    let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
        MockError::InvalidInput(format!("UTC offset {utc_offset_seconds}s is out of range"))
    })?;
    let window = DayWindow::for_date(DayWindow::parse_date(date)?, &offset)?;

    let mut rng = match (seed, config.seed) {
        (seed, _) if seed >= 0 => ChaCha8Rng::seed_from_u64(seed as u64),
        (_, Some(seed)) => ChaCha8Rng::seed_from_u64(seed),
        _ => ChaCha8Rng::from_entropy(),
    };

    let batch = build_batch(&window, &config, &mut rng)?;
    MockEncoder::new().encode_batch_to_json(&window, &batch)
}

fn summarize_sleep(intervals_json: &str) -> Result<String, MockError> {
    let intervals: Vec<RawStageInterval> = serde_json::from_str(intervals_json)?;
    let view = summarize(&intervals).as_ref().map(SleepView::from);
    Ok(serde_json::to_string(&view)?)
}

#[derive(Serialize)]
struct MetricEntry {
    metric: HealthMetric,
    #[serde(flatten)]
    spec: MetricSpec,
}

fn metric_specs() -> Result<String, MockError> {
    let mut entries: Vec<MetricEntry> = HealthMetric::ALL
        .iter()
        .map(|&metric| MetricEntry {
            metric,
            spec: *metric.spec(),
        })
        .collect();
    entries.sort_by_key(|e| e.spec.rank);
    Ok(serde_json::to_string(&entries)?)
}

// ============================================================================
// Generation API
// ============================================================================

/// Generate one day of mock samples and return the batch payload as JSON.
///
/// `date` is `YYYY-MM-DD` in the user's local calendar, `utc_offset_seconds`
/// the local offset east of UTC. A non-negative `seed` makes the output
/// reproducible. `config_json` may be NULL.
///
/// # Safety
/// - `date` must be a valid null-terminated C string.
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mock_free_string`.
/// - Returns NULL on error; call `mock_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mock_generate_day_json(
    date: *const c_char,
    utc_offset_seconds: i32,
    seed: i64,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        MockConfig::default()
    } else {
        let parsed = cstr_to_string(config_json)
            .ok_or_else(|| MockError::InvalidConfig("config is not valid UTF-8".to_string()))
            .and_then(|json| MockConfig::from_json(&json));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    finish(generate_day(&date_str, utc_offset_seconds, seed, config))
}

/// Summarize stored sleep intervals.
///
/// Input is a JSON array of `{ "code", "start", "end" }` records. Returns the
/// sleep view as JSON, or the JSON literal `null` when no usable intervals
/// were given.
///
/// # Safety
/// - `intervals_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mock_free_string`.
/// - Returns NULL on error; call `mock_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mock_summarize_sleep_json(intervals_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(intervals_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(summarize_sleep(&json_str))
}

/// Metric metadata table as a JSON array, in display order.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `mock_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mock_metric_specs_json() -> *mut c_char {
    clear_last_error();
    finish(metric_specs())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Mock functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Mock function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mock_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Mock function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mock_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Mock library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mock_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BatchPayload;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        mock_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_generate_day() {
        let date = CString::new("2024-01-15").unwrap();

        unsafe {
            let json = take_string(mock_generate_day_json(date.as_ptr(), -18_000, 42, ptr::null()));
            let payload: BatchPayload = serde_json::from_str(&json).unwrap();

            assert_eq!(payload.date, "2024-01-15");
            assert!(!payload.batch.sleep.is_empty());
            assert_eq!(payload.batch.quantities.len(), 7);
        }
    }

    #[test]
    fn test_ffi_seeded_generation_is_reproducible() {
        let date = CString::new("2024-01-15").unwrap();

        unsafe {
            let a: BatchPayload = serde_json::from_str(&take_string(mock_generate_day_json(
                date.as_ptr(),
                0,
                7,
                ptr::null(),
            )))
            .unwrap();
            let b: BatchPayload = serde_json::from_str(&take_string(mock_generate_day_json(
                date.as_ptr(),
                0,
                7,
                ptr::null(),
            )))
            .unwrap();

            assert_eq!(a.batch, b.batch);
        }
    }

    #[test]
    fn test_ffi_generate_with_config() {
        let date = CString::new("2024-01-15").unwrap();
        let config = CString::new(
            r#"{ "ranges": [{ "metric": "steps", "low": 100.0, "high": 100.0 }] }"#,
        )
        .unwrap();

        unsafe {
            let json = take_string(mock_generate_day_json(date.as_ptr(), 0, 1, config.as_ptr()));
            let payload: BatchPayload = serde_json::from_str(&json).unwrap();
            let steps = payload
                .batch
                .quantities
                .iter()
                .find(|q| q.metric == HealthMetric::Steps)
                .unwrap();
            assert_eq!(steps.value, 100.0);
        }
    }

    #[test]
    fn test_ffi_summarize_sleep() {
        let intervals = CString::new(
            r#"[
                { "code": 3, "start": "2024-01-14T22:00:00Z", "end": "2024-01-14T23:00:00Z" },
                { "code": 4, "start": "2024-01-14T23:00:00Z", "end": "2024-01-15T00:00:00Z" },
                { "code": 77, "start": "2024-01-15T00:00:00Z", "end": "2024-01-15T01:00:00Z" }
            ]"#,
        )
        .unwrap();

        unsafe {
            let json = take_string(mock_summarize_sleep_json(intervals.as_ptr()));
            let view: SleepView = serde_json::from_str(&json).unwrap();
            assert_eq!(view.total_minutes, 120.0);
            assert_eq!(view.summary.segments.len(), 2);
        }
    }

    #[test]
    fn test_ffi_summarize_no_data() {
        let intervals = CString::new("[]").unwrap();
        unsafe {
            let json = take_string(mock_summarize_sleep_json(intervals.as_ptr()));
            assert_eq!(json, "null");
        }
    }

    #[test]
    fn test_ffi_metric_specs() {
        unsafe {
            let json = take_string(mock_metric_specs_json());
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            let entries = value.as_array().unwrap();

            assert_eq!(entries.len(), 8);
            assert_eq!(entries[0]["metric"], "sleep");
            assert_eq!(entries[2]["title"], "Steps");
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let bad_date = CString::new("January 15").unwrap();

        unsafe {
            let result = mock_generate_day_json(bad_date.as_ptr(), 0, 1, ptr::null());
            assert!(result.is_null());

            let error = mock_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Date parse error"));

            let result = mock_summarize_sleep_json(ptr::null());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(mock_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
