//! Sleep subsystem
//!
//! Write path: architecture → merge → materialize.
//! Read path: stored intervals → merge → summary.

pub mod architecture;
pub mod materialize;
pub mod merge;
pub mod summary;

pub use architecture::{cycle_count, generate_architecture};
pub use materialize::{generate_night, materialize, sleep_anchor};
pub use merge::{merge_segments, push_merged};
pub use summary::summarize;
