//! Error types for dataset construction.

use thiserror::Error;

/// Errors raised when building a [`crate::Dataset`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    /// A row does not have one value per column.
    #[error("Row {row} has {actual} values but the dataset has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The same column name appears twice.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}
