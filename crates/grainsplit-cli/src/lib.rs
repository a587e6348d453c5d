// grainsplit command line
//
// Local drivers for the two pipeline steps:
// - split: discover partitioned files, run them through the batch processor
//   in mini-batches, report one status line per file
// - partition: group a flat dataset into one directory per grain
//
// Both take a fully resolved RuntimeConfig; flag parsing lives in main.rs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use grainsplit_batch::{discover_inputs, BatchProcessor, ProcessorOptions};
use grainsplit_config::RuntimeConfig;
use grainsplit_writer::{
    partition_dataset, partition_required, read_dataset, PartitionManifest, WriteOptions,
    WriterError,
};
use tracing::info;

mod init;
pub mod step_args;

pub use init::{init_tracing, normalize_level};
pub use step_args::{PrsArgs, StepArgs};

/// Split every file found under `inputs` into train/valid/test outputs.
///
/// Returns the status line of each processed file, in processing order.
pub fn run_split(config: &RuntimeConfig, inputs: &[PathBuf]) -> Result<Vec<String>> {
    config.split.validate()?;

    let files = discover_inputs(inputs, config.split.id_columns())
        .context("Failed to discover input files")?;
    if files.is_empty() {
        bail!("No input files found");
    }

    let processor = BatchProcessor::new(ProcessorOptions::from_config(config))?;
    let started = Instant::now();
    let statuses = processor
        .run(&files, config.batch.mini_batch_size)
        .context("Mini-batch processing failed")?;

    info!(
        files = files.len(),
        processed = statuses.len(),
        skipped = files.len() - statuses.len(),
        output = %config.output.path,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Split complete"
    );
    Ok(statuses)
}

/// Inputs of one partition run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRequest {
    pub partition_column_names: Vec<String>,
    /// Defaults to `<datastore>/<partitioned_dataset_name>`
    pub output_path: Option<PathBuf>,
    pub partitioned_dataset_name: String,
    /// Relative to the datastore directory
    pub input_data_path: String,
    pub datastore_name: String,
}

impl PartitionRequest {
    fn target(&self, datastore: &Path) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| datastore.join(&self.partitioned_dataset_name))
    }
}

/// Partition a datastore dataset by the requested columns.
///
/// Fails with "Dataset partitioning is not required." when the input is
/// already partitioned by (a superset of) those columns.
pub fn run_partition(config: &RuntimeConfig, request: &PartitionRequest) -> Result<PartitionManifest> {
    let datastore = config.datastore.resolve(&request.datastore_name);
    let input = datastore.join(&request.input_data_path);

    if !partition_required(&input, &request.partition_column_names)? {
        let existing = PartitionManifest::read(&input)?
            .map(|manifest| manifest.partition_keys)
            .unwrap_or_default();
        return Err(WriterError::partition_not_required(existing).into());
    }

    info!(
        columns = ?request.partition_column_names,
        input = %input.display(),
        "Performing dataset partition"
    );

    let table = read_dataset(&input)
        .with_context(|| format!("Failed to read dataset at {}", input.display()))?;
    let target = request.target(&datastore);
    let options = WriteOptions::with_row_group_size(config.output.parquet_row_group_size);

    let manifest = partition_dataset(
        table.batch(),
        &request.partition_column_names,
        &target,
        &request.partitioned_dataset_name,
        &options,
    )?;
    Ok(manifest)
}
