//! Loading input files into [`Table`]s.
//!
//! Parquet files written by pandas may carry their index as a regular column
//! (`__index_level_0__` or a named one) described by the `pandas` schema
//! metadata. That column is lifted out of the batch into the table's row
//! index so it is not written back as data.

use std::collections::HashMap;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{RecordBatch, RecordBatchOptions};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use grainsplit_core::{RowIndex, Table};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WriterError};
use crate::input_format::{raw_extension, InputFormat};

const PANDAS_METADATA_KEY: &str = "pandas";

/// Load a table, choosing the reader from the file extension.
///
/// `time_column` is parsed as a datetime for CSV input.
pub fn load_table(path: &Path, time_column: Option<&str>) -> Result<Table> {
    let format = InputFormat::from_path(path)
        .ok_or_else(|| WriterError::unsupported_format(path, raw_extension(path)))?;
    read_table(path, format, time_column)
}

/// Load a table in a known format.
pub fn read_table(path: &Path, format: InputFormat, time_column: Option<&str>) -> Result<Table> {
    let table = match format {
        InputFormat::Parquet => read_parquet(path)?,
        InputFormat::Csv => Table::new(read_csv(path, time_column)?),
    };
    debug!(
        path = %path.display(),
        format = format.extension(),
        rows = table.num_rows(),
        columns = table.schema().fields().len(),
        "loaded table"
    );
    Ok(table)
}

/// Read a Parquet file, lifting a pandas index column into the row index.
pub fn read_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| WriterError::read_failure(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| WriterError::read_failure(path, e))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| WriterError::read_failure(path, e))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| WriterError::read_failure(path, e))?;
    let batch = concat_batches(&schema, &batches).map_err(|e| WriterError::read_failure(path, e))?;

    lift_pandas_index(batch).map_err(|e| WriterError::read_failure(path, e))
}

/// Read a CSV file with a header row, inferring column types.
///
/// When `parse_dates` names a column, it is read as `Timestamp(ns)` unless it
/// was already inferred as a timestamp or a number.
pub fn read_csv(path: &Path, parse_dates: Option<&str>) -> Result<RecordBatch> {
    let mut file = File::open(path).map_err(|e| WriterError::read_failure(path, e))?;
    let format = Format::default().with_header(true);

    let (schema, _) = format
        .infer_schema(&mut file, None)
        .map_err(|e| WriterError::read_failure(path, e))?;
    file.rewind()
        .map_err(|e| WriterError::read_failure(path, e))?;

    let schema = match parse_dates {
        Some(column) => with_datetime_column(&schema, column)
            .ok_or_else(|| {
                WriterError::schema_mismatch(
                    path,
                    format!("Missing column provided to 'parse_dates': '{column}'"),
                )
            })?,
        None => schema,
    };
    let schema: SchemaRef = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)
        .map_err(|e| WriterError::read_failure(path, e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| WriterError::read_failure(path, e))?;

    concat_batches(&schema, &batches).map_err(|e| WriterError::read_failure(path, e))
}

/// Schema with `column` coerced to a datetime; `None` if the column is absent.
fn with_datetime_column(schema: &Schema, column: &str) -> Option<Schema> {
    let (position, _) = schema.column_with_name(column)?;
    let fields = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            if i == position && needs_datetime_parse(field.data_type()) {
                Arc::new(Field::new(
                    field.name(),
                    DataType::Timestamp(TimeUnit::Nanosecond, None),
                    field.is_nullable(),
                ))
            } else {
                field.clone()
            }
        })
        .collect::<Vec<_>>();
    Some(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

fn needs_datetime_parse(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Date32 | DataType::Date64
    )
}

#[derive(Debug, Deserialize)]
struct PandasMetadata {
    #[serde(default)]
    index_columns: Vec<serde_json::Value>,
    #[serde(default)]
    columns: Vec<PandasColumn>,
}

#[derive(Debug, Deserialize)]
struct PandasColumn {
    name: Option<String>,
    field_name: Option<String>,
}

/// Move a single stored pandas index column out of the batch.
///
/// Range indexes are not stored as columns and multi-level indexes are left
/// in place; both get a positional row index. The `pandas` metadata entry is
/// dropped either way since it no longer describes the data we write.
fn lift_pandas_index(batch: RecordBatch) -> std::result::Result<Table, ArrowError> {
    let schema = batch.schema();
    let Some(raw) = schema.metadata().get(PANDAS_METADATA_KEY) else {
        return Ok(Table::new(batch));
    };

    let mut metadata: HashMap<String, String> = schema.metadata().clone();
    metadata.remove(PANDAS_METADATA_KEY);

    let stored_index = serde_json::from_str::<PandasMetadata>(raw)
        .ok()
        .and_then(|pandas| {
            let [serde_json::Value::String(field_name)] = pandas.index_columns.as_slice() else {
                return None;
            };
            let label = pandas
                .columns
                .iter()
                .find(|c| c.field_name.as_deref() == Some(field_name.as_str()))
                .and_then(|c| c.name.clone());
            let (position, _) = schema.column_with_name(field_name)?;
            Some((position, label))
        });

    let Some((position, label)) = stored_index else {
        return Ok(Table::new(replace_metadata(&batch, metadata)?));
    };

    let keep: Vec<usize> = (0..schema.fields().len())
        .filter(|&i| i != position)
        .collect();
    let index_values = batch.column(position).clone();
    let data = replace_metadata(&batch.project(&keep)?, metadata)?;

    debug!(name = ?label, "lifted pandas index column");
    Table::with_index(data, RowIndex::new(label, index_values))
        .map_err(|e| ArrowError::InvalidArgumentError(e.to_string()))
}

fn replace_metadata(
    batch: &RecordBatch,
    metadata: HashMap<String, String>,
) -> std::result::Result<RecordBatch, ArrowError> {
    let schema = Schema::new_with_metadata(batch.schema().fields().clone(), metadata);
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(Arc::new(schema), batch.columns().to_vec(), &options)
}
