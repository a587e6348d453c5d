// Dataset partitioning by grain columns
//
// Produces the layout the split step consumes:
//   <target>/<value_1>/<value_2>/.../part-0.parquet
//   <target>/_partition.json
//
// The manifest records which columns the directory levels stand for, so a
// later run can tell that the data is already partitioned.

use std::fs;
use std::path::{Path, PathBuf};

use arrow::array::{ArrayRef, RecordBatch, UInt64Array};
use arrow::compute::{concat_batches, take_record_batch};
use arrow::error::ArrowError;
use arrow::row::{RowConverter, SortField};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::{SecondsFormat, Utc};
use grainsplit_core::{GrainPath, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoding::WriteOptions;
use crate::error::{Result, WriterError};
use crate::input_format::InputFormat;
use crate::read::read_table;
use crate::write::{write_parquet_file, PART_FILE_NAME};

/// Manifest file written next to the partition directories
pub const MANIFEST_FILE_NAME: &str = "_partition.json";

/// Directory name used for null partition values
pub const NULL_PARTITION_VALUE: &str = "__null__";

/// Description of a partitioned dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionManifest {
    pub name: String,
    pub partition_keys: Vec<String>,
    pub files: usize,
    pub rows: usize,
    pub created_at: String,
}

impl PartitionManifest {
    /// Read `<dir>/_partition.json` if present.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| WriterError::read_failure(&path, e))?;
        let manifest =
            serde_json::from_str(&content).map_err(|e| WriterError::read_failure(&path, e))?;
        Ok(Some(manifest))
    }

    fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let content =
            serde_json::to_string(self).map_err(|e| WriterError::write_failure(&path, e))?;
        fs::write(&path, content).map_err(|e| WriterError::write_failure(&path, e))?;
        Ok(path)
    }
}

/// Whether partitioning `input` by `partition_columns` would change anything.
///
/// The input's partition keys come from its manifest; a single file or a
/// plain directory of files has none. Partitioning is required unless every
/// requested column is already a key.
pub fn partition_required(input: &Path, partition_columns: &[String]) -> Result<bool> {
    if !input.exists() {
        return Err(WriterError::read_failure(input, "input data path does not exist"));
    }

    let keys = if input.is_dir() {
        PartitionManifest::read(input)?
            .map(|manifest| manifest.partition_keys)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(!partition_columns.iter().all(|column| keys.contains(column)))
}

/// Load a file, or every CSV/Parquet file directly inside a directory.
///
/// Files of a directory are read in name order and must share one schema.
pub fn read_dataset(input: &Path) -> Result<Table> {
    if !input.is_dir() {
        let format = InputFormat::from_path(input).ok_or_else(|| {
            WriterError::unsupported_format(input, crate::input_format::raw_extension(input))
        })?;
        return read_table(input, format, None);
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(input).map_err(|e| WriterError::read_failure(input, e))?;
    for entry in entries {
        let path = entry.map_err(|e| WriterError::read_failure(input, e))?.path();
        if path.is_file() {
            if let Some(format) = InputFormat::from_path(&path) {
                files.push((path, format));
            }
        }
    }
    files.sort_by(|(a, _), (b, _)| a.cmp(b));

    let Some(((first_path, first_format), rest)) = files.split_first() else {
        return Err(WriterError::read_failure(
            input,
            "directory contains no parquet or csv files",
        ));
    };

    let first = read_table(first_path, *first_format, None)?.into_batch();
    let schema = first.schema();
    let mut batches = vec![first];
    for (path, format) in rest {
        let batch = read_table(path, *format, None)?.into_batch();
        if batch.schema().fields() != schema.fields() {
            return Err(WriterError::schema_mismatch(
                path,
                format!("columns differ from {}", first_path.display()),
            ));
        }
        batches.push(batch);
    }

    let batch = concat_batches(&schema, &batches).map_err(|e| WriterError::read_failure(input, e))?;
    Ok(Table::new(batch))
}

/// Write one file per distinct combination of `partition_columns` values.
///
/// Partitions appear in the order their values first occur. Every column,
/// including the partition columns, is kept in the written files.
pub fn partition_dataset(
    batch: &RecordBatch,
    partition_columns: &[String],
    target: &Path,
    name: &str,
    options: &WriteOptions,
) -> Result<PartitionManifest> {
    let columns = partition_columns
        .iter()
        .map(|column| {
            batch.column_by_name(column).cloned().ok_or_else(|| {
                WriterError::schema_mismatch(target, format!("partition column '{column}' not found"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let groups = group_by_values(&columns, batch.num_rows())
        .map_err(|e| WriterError::schema_mismatch(target, e))?;

    let format_options = FormatOptions::default().with_null(NULL_PARTITION_VALUE);
    let formatters = columns
        .iter()
        .map(|array| ArrayFormatter::try_new(array.as_ref(), &format_options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| WriterError::schema_mismatch(target, e))?;

    // Directory names are sanitized, so distinct values can land on one name.
    let mut partitions: IndexMap<GrainPath, Vec<u64>> = IndexMap::with_capacity(groups.len());
    for rows in groups {
        let Some(&first) = rows.first() else {
            continue;
        };
        let first = first as usize;
        let grain = GrainPath::from_values(
            formatters
                .iter()
                .map(|formatter| formatter.value(first).to_string()),
        );
        if let Some(existing) = partitions.get(&grain) {
            let existing = existing.first().copied().unwrap_or_default() as usize;
            return Err(WriterError::partition_collision(&grain, existing, first));
        }
        partitions.insert(grain, rows);
    }

    fs::create_dir_all(target).map_err(|e| WriterError::write_failure(target, e))?;

    for (grain, rows) in &partitions {
        let part = take_record_batch(batch, &UInt64Array::from(rows.clone()))
            .map_err(|e| WriterError::write_failure(target, e))?;
        let path = target.join(grain.to_path_buf()).join(PART_FILE_NAME);
        let props = options.writer_properties(&[("grainsplit.partition", grain.to_string())]);
        write_parquet_file(&part, &path, props)?;
        debug!(grain = %grain, rows = part.num_rows(), "wrote partition");
    }

    let manifest = PartitionManifest {
        name: name.to_string(),
        partition_keys: partition_columns.to_vec(),
        files: partitions.len(),
        rows: batch.num_rows(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    manifest.write(target)?;

    info!(
        name,
        partitions = manifest.files,
        rows = manifest.rows,
        target = %target.display(),
        "partitioned dataset"
    );
    Ok(manifest)
}

/// Row positions per distinct value combination, in first-appearance order.
fn group_by_values(
    columns: &[ArrayRef],
    num_rows: usize,
) -> std::result::Result<Vec<Vec<u64>>, ArrowError> {
    if columns.is_empty() {
        return Ok(vec![(0..num_rows as u64).collect()]);
    }

    let converter = RowConverter::new(
        columns
            .iter()
            .map(|array| SortField::new(array.data_type().clone()))
            .collect(),
    )?;
    let keys = converter.convert_columns(columns)?;

    let mut groups: IndexMap<_, Vec<u64>> = IndexMap::new();
    for row in 0..num_rows {
        groups.entry(keys.row(row)).or_default().push(row as u64);
    }
    Ok(groups.into_values().collect())
}
