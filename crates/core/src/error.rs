//! Error types for nightglow

use thiserror::Error;

/// Fatal error type for nightglow operations.
///
/// These are precondition violations (misaligned grids, malformed inputs).
/// Recoverable per-unit conditions are reported as [`crate::DataIssue`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Grid mismatch: expected {expected}, got {actual}")]
    GridMismatch { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid period '{0}': expected YYYY or YYYY-MM")]
    InvalidPeriod(String),

    #[error("Duplicate record for unit '{unit}' at {period}")]
    DuplicateRecord { unit: String, period: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result type alias for nightglow operations
pub type Result<T> = std::result::Result<T, Error>;
