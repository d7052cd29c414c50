//! Error types for the cpu_forecast crate

use thiserror::Error;

/// Custom error types for the cpu_forecast crate
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The metrics source query failed or timed out
    #[error("metrics source unavailable: {0}")]
    SourceUnavailable(String),

    /// Fewer samples than a full input window; expected during warm-up
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// The prediction call failed or returned a malformed response
    #[error("prediction endpoint error: {0}")]
    Endpoint(String),

    /// No comparable actual/forecast pair in the evaluation window
    #[error("insufficient overlap: {0}")]
    InsufficientOverlap(String),

    /// Store read or write failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Non-finite sample value or degenerate numeric input
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}
