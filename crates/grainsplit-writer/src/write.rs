//! Parquet output for split and partitioned tables
//!
//! Layout of a split run:
//!   <root>/train/<grain_path>/part-0.parquet
//!   <root>/valid/<grain_path>/part-0.parquet
//!   <root>/test/<grain_path>/part-0.parquet
//!
//! Paths are deterministic so a retried mini-batch overwrites its own output.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use grainsplit_core::GrainPath;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::encoding::WriteOptions;
use crate::error::{Result, WriterError};

/// File name of the single part written per grain directory
pub const PART_FILE_NAME: &str = "part-0.parquet";

/// Which subset of a split a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitName {
    Train,
    Valid,
    Test,
}

impl SplitName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output tree rooted at one directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    options: WriteOptions,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, options: WriteOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// `<root>/<split>/<grain>/part-0.parquet`
    pub fn part_path(&self, split: SplitName, grain: &GrainPath) -> PathBuf {
        self.root
            .join(split.as_str())
            .join(grain.to_path_buf())
            .join(PART_FILE_NAME)
    }

    /// Write one subset for one grain, replacing any earlier attempt.
    pub fn write_split(
        &self,
        split: SplitName,
        grain: &GrainPath,
        batch: &RecordBatch,
    ) -> Result<PathBuf> {
        let path = self.part_path(split, grain);
        let props = self.options.writer_properties(&[
            ("grainsplit.split", split.as_str().to_string()),
            ("grainsplit.grain", grain.to_string()),
        ]);
        write_parquet_file(batch, &path, props)?;

        debug!(
            split = %split,
            grain = %grain,
            rows = batch.num_rows(),
            path = %path.display(),
            "wrote split"
        );
        Ok(path)
    }
}

/// Write Arrow `RecordBatch` into an arbitrary `Write` sink.
pub fn write_parquet_into<W>(batch: &RecordBatch, writer: W, props: WriterProperties) -> Result<()>
where
    W: Write + Send,
{
    let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(props))
        .map_err(|e| WriterError::write_failure(Path::new("<stream>"), e))?;
    arrow_writer
        .write(batch)
        .map_err(|e| WriterError::write_failure(Path::new("<stream>"), e))?;
    arrow_writer
        .close()
        .map_err(|e| WriterError::write_failure(Path::new("<stream>"), e))?;
    Ok(())
}

/// Write a batch to `path`, creating parent directories as needed.
///
/// An empty batch still produces a valid file carrying the schema.
pub fn write_parquet_file(batch: &RecordBatch, path: &Path, props: WriterProperties) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WriterError::write_failure(parent, e))?;
    }

    let file = File::create(path).map_err(|e| WriterError::write_failure(path, e))?;
    write_parquet_into(batch, file, props).map_err(|e| match e {
        WriterError::WriteFailure { reason, .. } => WriterError::write_failure(path, reason),
        other => other,
    })
}
