//! Grain-aware chronological splitting.
//!
//! Every grain (rows sharing the same grain-column values) is ordered by the
//! time column and cut so that its most recent `floor(len * fraction)` rows
//! land in the tail. Grains are emitted in order of first appearance in the
//! input; rows inside a grain are emitted chronologically.

use arrow::array::{ArrayRef, RecordBatch, UInt64Array};
use arrow::compute::{take_record_batch, SortOptions};
use arrow::row::{RowConverter, Rows, SortField};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, SplitError};
use crate::table::{column, Table};

/// Split `batch` per grain into (earlier rows, most recent rows).
///
/// With no grain columns the whole batch is one grain. A fraction of 0 keeps
/// everything in the head. The input batch is not modified.
pub fn split_by_grain(
    batch: &RecordBatch,
    fraction: f64,
    time_column: &str,
    grain_columns: &[String],
) -> Result<(RecordBatch, RecordBatch)> {
    let plan = SplitPlan::compute(batch, fraction, time_column, grain_columns)?;
    Ok((
        take_record_batch(batch, &plan.head)?,
        take_record_batch(batch, &plan.tail)?,
    ))
}

/// Same split as [`split_by_grain`], carrying the table's row index through.
///
/// Every output row keeps the exact index value it had in `table`, and both
/// outputs keep the index name.
pub fn split_for_forecasting(
    table: &Table,
    time_column: &str,
    fraction: f64,
    grain_columns: &[String],
) -> Result<(Table, Table)> {
    let batch = table.batch();
    let plan = SplitPlan::compute(batch, fraction, time_column, grain_columns)?;

    let head = Table::with_index(
        take_record_batch(batch, &plan.head)?,
        table.index().take(&plan.head)?,
    )?;
    let tail = Table::with_index(
        take_record_batch(batch, &plan.tail)?,
        table.index().take(&plan.tail)?,
    )?;

    Ok((head, tail))
}

/// Number of rows a grain of `len` rows keeps in the head.
pub fn head_len(len: usize, fraction: f64) -> usize {
    if fraction == 0.0 {
        return len;
    }
    let held_out = (len as f64 * fraction).floor() as usize;
    len - held_out.min(len)
}

/// Row positions selected for each side of the split.
struct SplitPlan {
    head: UInt64Array,
    tail: UInt64Array,
}

impl SplitPlan {
    fn compute(
        batch: &RecordBatch,
        fraction: f64,
        time_column: &str,
        grain_columns: &[String],
    ) -> Result<Self> {
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            return Err(SplitError::InvalidFraction(fraction));
        }

        let time = column(batch, time_column)?;
        let grains = grain_columns
            .iter()
            .map(|name| column(batch, name).cloned())
            .collect::<Result<Vec<_>>>()?;

        let num_rows = batch.num_rows();
        let time_keys = time_sort_keys(time)?;
        let groups = group_rows(&grains, num_rows)?;
        let num_grains = groups.len();

        let mut head = Vec::with_capacity(num_rows);
        let mut tail = Vec::new();
        for mut rows in groups {
            // Vec::sort_by is stable: equal timestamps keep input order
            rows.sort_by(|&a, &b| time_keys.row(a).cmp(&time_keys.row(b)));
            let cut = head_len(rows.len(), fraction);
            head.extend(rows[..cut].iter().map(|&row| row as u64));
            tail.extend(rows[cut..].iter().map(|&row| row as u64));
        }

        debug!(
            num_rows,
            num_grains,
            fraction,
            head_rows = head.len(),
            tail_rows = tail.len(),
            "split table by grain"
        );

        Ok(Self {
            head: UInt64Array::from(head),
            tail: UInt64Array::from(tail),
        })
    }
}

/// Ascending, nulls last.
fn time_sort_keys(time: &ArrayRef) -> Result<Rows> {
    let converter = RowConverter::new(vec![SortField::new_with_options(
        time.data_type().clone(),
        SortOptions {
            descending: false,
            nulls_first: false,
        },
    )])?;
    Ok(converter.convert_columns(&[time.clone()])?)
}

/// Row positions per grain, grains in first-appearance order.
fn group_rows(grains: &[ArrayRef], num_rows: usize) -> Result<Vec<Vec<usize>>> {
    if grains.is_empty() {
        return Ok(vec![(0..num_rows).collect()]);
    }

    let converter = RowConverter::new(
        grains
            .iter()
            .map(|array| SortField::new(array.data_type().clone()))
            .collect(),
    )?;
    let keys = converter.convert_columns(grains)?;

    let mut groups: IndexMap<_, Vec<usize>> = IndexMap::new();
    for row in 0..num_rows {
        groups.entry(keys.row(row)).or_default().push(row);
    }
    Ok(groups.into_values().collect())
}
