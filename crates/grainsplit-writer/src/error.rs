//! Error types for the grainsplit writer crate

use grainsplit_core::SplitError;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Input file extension is neither parquet nor csv
    E001UnsupportedFormat,
    /// E002: Input file could not be opened or decoded
    E002ReadFailure,
    /// E003: Output file or directory could not be written
    E003WriteFailure,
    /// E004: Input schema does not match what the operation needs
    E004SchemaMismatch,
    /// E005: Requested partitioning is already satisfied by the input
    E005PartitionNotRequired,
    /// E006: Distinct partition values map to the same directory name
    E006PartitionCollision,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001UnsupportedFormat => "E001",
            Self::E002ReadFailure => "E002",
            Self::E003WriteFailure => "E003",
            Self::E004SchemaMismatch => "E004",
            Self::E005PartitionNotRequired => "E005",
            Self::E006PartitionCollision => "E006",
        }
    }
}

/// Errors that can occur while loading, writing or partitioning tables
#[derive(Debug, Error)]
pub enum WriterError {
    /// Input extension not recognized
    #[error("[{code}] Unrecognized file format for '{path}'. Expected either 'parquet' or 'csv', received '{extension}'")]
    UnsupportedFormat {
        code: &'static str,
        path: String,
        extension: String,
    },

    /// Reading or decoding an input failed
    #[error("[{code}] Failed to read '{path}': {reason}")]
    ReadFailure {
        code: &'static str,
        path: String,
        reason: String,
    },

    /// Writing an output failed
    #[error("[{code}] Failed to write '{path}': {reason}")]
    WriteFailure {
        code: &'static str,
        path: String,
        reason: String,
    },

    /// Schema is missing a column or disagrees across files
    #[error("[{code}] Schema mismatch in '{path}': {reason}")]
    SchemaMismatch {
        code: &'static str,
        path: String,
        reason: String,
    },

    /// Partition columns already satisfied by the existing layout
    #[error("[{code}] Dataset partitioning is not required.")]
    PartitionNotRequired {
        code: &'static str,
        /// Partition keys the input already has
        existing: Vec<String>,
    },

    /// Two different partition keys sanitize to one directory
    #[error("[{code}] Rows {first_row} and {second_row} have different partition values but both map to '{directory}'")]
    PartitionCollision {
        code: &'static str,
        directory: String,
        first_row: usize,
        second_row: usize,
    },

    /// Splitting or grain handling failed
    #[error(transparent)]
    Split(#[from] SplitError),
}

impl WriterError {
    /// Create an unsupported format error with error code
    pub fn unsupported_format(path: &Path, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            code: ErrorCode::E001UnsupportedFormat.as_str(),
            path: path.display().to_string(),
            extension: extension.into(),
        }
    }

    /// Create a read failure error with error code
    pub fn read_failure(path: &Path, reason: impl Display) -> Self {
        Self::ReadFailure {
            code: ErrorCode::E002ReadFailure.as_str(),
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a write failure error with error code
    pub fn write_failure(path: &Path, reason: impl Display) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E003WriteFailure.as_str(),
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a schema mismatch error with error code
    pub fn schema_mismatch(path: &Path, reason: impl Display) -> Self {
        Self::SchemaMismatch {
            code: ErrorCode::E004SchemaMismatch.as_str(),
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a partition-not-required error with error code
    pub fn partition_not_required(existing: Vec<String>) -> Self {
        Self::PartitionNotRequired {
            code: ErrorCode::E005PartitionNotRequired.as_str(),
            existing,
        }
    }

    /// Create a partition collision error with error code
    pub fn partition_collision(directory: impl Display, first_row: usize, second_row: usize) -> Self {
        Self::PartitionCollision {
            code: ErrorCode::E006PartitionCollision.as_str(),
            directory: directory.to_string(),
            first_row,
            second_row,
        }
    }

    /// Error code for programmatic handling, if this error carries one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedFormat { code, .. }
            | Self::ReadFailure { code, .. }
            | Self::WriteFailure { code, .. }
            | Self::SchemaMismatch { code, .. }
            | Self::PartitionNotRequired { code, .. }
            | Self::PartitionCollision { code, .. } => Some(*code),
            Self::Split(_) => None,
        }
    }
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_codes() {
        let err = WriterError::unsupported_format(Path::new("a/b.txt"), "txt");
        assert_eq!(err.code(), Some("E001"));
        assert_eq!(
            err.to_string(),
            "[E001] Unrecognized file format for 'a/b.txt'. Expected either 'parquet' or 'csv', received 'txt'"
        );

        let err = WriterError::partition_not_required(vec!["store".to_string()]);
        assert_eq!(err.to_string(), "[E005] Dataset partitioning is not required.");
    }

    #[test]
    fn test_split_errors_pass_through() {
        let err: WriterError = SplitError::InvalidFraction(1.5).into();
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "split fraction must be in [0, 1), got 1.5");
    }
}
