// grainsplit-core - Pure splitting logic
//
// Grain-aware chronological train/validation/test splitting over Arrow
// record batches. No file I/O, no runtime: loading and writing tables is
// the writer crate's job, scheduling files is the batch crate's job.

pub mod error;
pub mod grain;
pub mod split;
pub mod table;

pub use error::{Result, SplitError};
pub use grain::{partition_format, sanitize_segment, GrainPath};
pub use split::{head_len, split_by_grain, split_for_forecasting};
pub use table::{RowIndex, Table};
