//! Error types for Neo4j type conversions.
//!
//! Unexpected values are reported as errors instead of being replaced by a
//! default.

use thiserror::Error;

/// Errors that can occur during Neo4j type conversions.
#[derive(Debug, Error)]
pub enum Neo4jTypesError {
    /// NaN float values cannot be represented in Neo4j.
    #[error("NaN float values cannot be represented in Neo4j")]
    NanFloat,

    /// Infinity float values cannot be represented in Neo4j.
    #[error("Infinity float values cannot be represented in Neo4j")]
    InfinityFloat,

    /// Neo4j type cannot be converted to a tabular value.
    #[error("Neo4j {bolt_type} cannot be converted to a value; return its properties instead")]
    UnsupportedBoltType { bolt_type: String },

    /// A column of a result row could not be read.
    #[error("Failed to read column '{column}': {error}")]
    Column { column: String, error: String },

    /// Invalid date value.
    #[error("Invalid date: {reason}")]
    InvalidDate { reason: String },

    /// Invalid datetime value.
    #[error("Invalid datetime: {reason}")]
    InvalidDateTime { reason: String },
}

/// Result type for Neo4j type conversions.
pub type Result<T> = std::result::Result<T, Neo4jTypesError>;
