//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
///
/// Most fetch paths log these and degrade to an empty result; they only
/// surface to callers from the lower-level helpers.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP error (non-success status)
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// Status code returned by the server
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// J-Quants API error
    #[error("J-Quants API error: {0}")]
    Api(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Date arithmetic left the supported calendar
    #[error("Date out of range: {start} plus {days} days")]
    DateOutOfRange {
        /// First day of the window
        start: String,
        /// Requested length in days
        days: u32,
    },

    /// Spreadsheet error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<calamine::XlsxError> for DataError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}
