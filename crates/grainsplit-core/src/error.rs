//! Error types for the split core

use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised while splitting a table or deriving grain identity
#[derive(Debug, Error)]
pub enum SplitError {
    /// Split fraction outside [0, 1) or not a finite number
    #[error("split fraction must be in [0, 1), got {0}")]
    InvalidFraction(f64),

    /// A time or grain column is not part of the table schema
    #[error("column '{column}' not found in table (available: {available})")]
    MissingColumn { column: String, available: String },

    /// Row index length disagrees with the batch it describes
    #[error("row index has {index_len} entries but the table has {num_rows} rows")]
    IndexLength { index_len: usize, num_rows: usize },

    /// File path is too shallow to carry the expected grain directories
    #[error("grain path for '{path}' needs {expected} parent directories, found {found}")]
    GrainPathDepth {
        path: String,
        expected: usize,
        found: usize,
    },

    /// Arrow kernel failure (unsupported sort type, take out of bounds, ...)
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Result type alias for SplitError
pub type Result<T> = std::result::Result<T, SplitError>;
