//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while ingesting and normalizing the raw catalog
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A CSV record couldn't be decoded
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at record {record} in {file}: {reason}")]
    ParseError {
        file: String,
        record: usize,
        reason: String,
    },

    /// A required column is missing from the CSV header
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A serialized metadata field (genres/keywords/cast/crew) is malformed
    #[error("Malformed {field} field for movie {movie_id}: {source}")]
    MalformedField {
        movie_id: u32,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
