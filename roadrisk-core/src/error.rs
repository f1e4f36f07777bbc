//! Error types for roadrisk-core.

use thiserror::Error;

/// Result type alias for roadrisk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Input validation failures.
///
/// Raised per record during detection (the record is dropped) and per call
/// during evaluation (the call is aborted).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Latitude is non-finite or outside [-90, 90].
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude is non-finite or outside [-180, 180].
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// A required field was absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field was present but could not be interpreted.
    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: String, value: String },

    /// Search radius is negative or non-finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),
}

/// Core error types for roadrisk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Clustering error.
    #[error("clustering error: {0}")]
    Clustering(String),
}
