//! Error types for gate operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("no required checks configured; a gate with no checks must not silently pass")]
    EmptyCheckSet,

    #[error("check name must not be empty or whitespace")]
    EmptyCheckName,

    #[error("invalid configuration: {field} must be positive")]
    NonPositiveDuration { field: &'static str },

    #[error("status source error for check '{check}': {reason}")]
    Source { check: String, reason: String },

    #[error("failed to publish gate result: {0}")]
    Publish(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
