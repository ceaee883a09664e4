//! Error types for the measurement tools.

use thiserror::Error;

/// Errors that can occur while reading or summarizing measurements
#[derive(Error, Debug)]
pub enum MeasureError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unit label outside the recognized set
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Input line that does not match the expected shape
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    /// File name that does not follow `algo_test_YYYYMMDD_HHMM`
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Capture export without any packet rows
    #[error("Capture contains no packets")]
    EmptyCapture,
}

/// Result type for measurement operations
pub type Result<T> = std::result::Result<T, MeasureError>;
