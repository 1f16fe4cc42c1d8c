//! Error types for Synheart Mock

use thiserror::Error;

/// Errors that can occur while generating or summarizing mock data
#[derive(Debug, Error)]
pub enum MockError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Health store access is not authorized")]
    Unauthorized,

    #[error("Health store error: {0}")]
    StoreError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
