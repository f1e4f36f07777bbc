//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unreadable CSV file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File extension is neither `.json` nor `.csv`.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}
