// grainsplit-batch - Mini-batch processing of partitioned time-series files
//
// Takes the files of one mini-batch, splits each into train/valid/test by
// time and writes the subsets under a per-grain output tree.

mod error;
mod mini_batch;
mod processor;

pub use error::{BatchError, Result};
pub use mini_batch::{discover_inputs, mini_batches};
pub use processor::{BatchProcessor, ProcessorOptions};
