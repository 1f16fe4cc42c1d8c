//! Synheart Mock - On-device mock health data generator
//!
//! Mock produces a day of plausible health samples for exercising apps built
//! on a platform health store: one night of sleep with realistic stage
//! architecture plus single-value samples for activity metrics. It also
//! summarizes stored sleep records back into per-stage totals.
//!
//! ## Modules
//!
//! - **Sleep**: architecture generation → merge → materialization, and the
//!   summary aggregation that inverts it
//! - **Metrics**: bounded random quantity samples per activity metric
//! - **Processor**: the authorize / load / generate cycle over a [`HealthStore`]

pub mod config;
pub mod encoder;
pub mod error;
pub mod interval;
pub mod metrics;
pub mod processor;
pub mod sleep;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::MockConfig;
pub use error::MockError;
pub use interval::DayWindow;
pub use processor::{build_batch, MockProcessor, SessionState};
pub use store::{HealthStore, InMemoryStore};

/// Mock version embedded in all payloads
pub const MOCK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "synheart-mock";
