//! In-memory table: an Arrow batch plus the row index that travels with it.
//!
//! Arrow batches have no notion of a row index, so the index lives beside the
//! batch. It is never written to output files; it only lets callers trace
//! every split row back to its position in the loaded file.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch, UInt64Array};
use arrow::compute::take;
use arrow::datatypes::SchemaRef;

use crate::error::{Result, SplitError};

/// Identity of each row, optionally named.
#[derive(Debug, Clone)]
pub struct RowIndex {
    name: Option<String>,
    values: ArrayRef,
}

impl RowIndex {
    /// Positional index `0..len`, unnamed.
    pub fn range(len: usize) -> Self {
        let values = UInt64Array::from_iter_values(0..len as u64);
        Self {
            name: None,
            values: Arc::new(values),
        }
    }

    pub fn new(name: Option<String>, values: ArrayRef) -> Self {
        Self { name, values }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Select index entries by position; the name is kept.
    pub(crate) fn take(&self, positions: &UInt64Array) -> Result<Self> {
        Ok(Self {
            name: self.name.clone(),
            values: take(self.values.as_ref(), positions, None)?,
        })
    }
}

/// A loaded table with its row index.
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
    index: RowIndex,
}

impl Table {
    /// Wrap a batch with a positional index.
    pub fn new(batch: RecordBatch) -> Self {
        let index = RowIndex::range(batch.num_rows());
        Self { batch, index }
    }

    /// Wrap a batch with an explicit index of the same length.
    pub fn with_index(batch: RecordBatch, index: RowIndex) -> Result<Self> {
        if index.len() != batch.num_rows() {
            return Err(SplitError::IndexLength {
                index_len: index.len(),
                num_rows: batch.num_rows(),
            });
        }
        Ok(Self { batch, index })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Drop the index and keep the rows, e.g. before writing.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }
}

/// Look up a column by name with a readable error.
pub(crate) fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SplitError::MissingColumn {
            column: name.to_string(),
            available: batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn batch(rows: usize) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
        RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from_iter_values(0..rows as i64))],
        )
        .unwrap()
    }

    #[test]
    fn new_table_gets_positional_index() {
        let table = Table::new(batch(3));
        let index = table
            .index()
            .values()
            .as_any()
            .downcast_ref::<UInt64Array>()
            .unwrap();
        assert_eq!(index.values(), &[0, 1, 2]);
        assert_eq!(table.index().name(), None);
    }

    #[test]
    fn with_index_rejects_length_mismatch() {
        let index = RowIndex::new(None, Arc::new(StringArray::from(vec!["a"])));
        let err = Table::with_index(batch(2), index).unwrap_err();
        assert!(matches!(
            err,
            SplitError::IndexLength {
                index_len: 1,
                num_rows: 2
            }
        ));
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let b = batch(1);
        let err = column(&b, "date").unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'date' not found in table (available: v)"
        );
    }
}
