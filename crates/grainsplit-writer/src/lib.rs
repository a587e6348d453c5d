//! Table I/O for grainsplit
//!
//! Loads CSV and Parquet inputs into [`grainsplit_core::Table`]s, writes split
//! subsets as uncompressed Parquet under a deterministic layout, and
//! partitions flat datasets into one directory per grain.

mod encoding;
mod error;
mod input_format;
mod partition;
mod read;
mod write;

pub use encoding::WriteOptions;
pub use error::{ErrorCode, Result, WriterError};
pub use input_format::{raw_extension, InputFormat};
pub use partition::{
    partition_dataset, partition_required, read_dataset, PartitionManifest, MANIFEST_FILE_NAME,
    NULL_PARTITION_VALUE,
};
pub use read::{load_table, read_csv, read_parquet, read_table};
pub use write::{
    write_parquet_file, write_parquet_into, OutputLayout, SplitName, PART_FILE_NAME,
};

// Re-export commonly used types for convenience
pub use grainsplit_core;
