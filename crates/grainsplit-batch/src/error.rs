use grainsplit_core::SplitError;
use grainsplit_writer::WriterError;
use thiserror::Error;

/// Errors that abort a mini-batch
#[derive(Debug, Error)]
pub enum BatchError {
    /// Loading, writing or splitting a file failed
    #[error(transparent)]
    Writer(#[from] WriterError),

    /// Splitting failed outside the writer (grain path derivation)
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Input discovery could not expand a directory
    #[error("failed to discover inputs under '{path}': {reason}")]
    Discovery { path: String, reason: String },

    /// Options rejected before any file was touched
    #[error("invalid processor options: {0}")]
    InvalidOptions(String),
}

impl BatchError {
    /// True for a file path that is too shallow for the configured grain
    /// columns.
    pub fn is_grain_path_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Split(SplitError::GrainPathDepth { .. })
                | Self::Writer(WriterError::Split(SplitError::GrainPathDepth { .. }))
        )
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
