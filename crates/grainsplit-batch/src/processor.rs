// Per-file split driver
//
// Each input file holds exactly one grain (upstream partitioning put it in
// its own directory), so the splitter runs with no grain columns and the grain
// identity comes from the file path instead.
//
// Output per file:
//   <output_root>/test/<grain>/part-0.parquet    (only when test_split > 0)
//   <output_root>/valid/<grain>/part-0.parquet   (only when valid_split > 0)
//   <output_root>/train/<grain>/part-0.parquet

use std::path::{Path, PathBuf};

use grainsplit_config::RuntimeConfig;
use grainsplit_core::{split_for_forecasting, GrainPath, Table};
use grainsplit_writer::{
    raw_extension, read_table, InputFormat, OutputLayout, SplitName, WriteOptions, WriterError,
};
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};

/// Everything the processor needs; built once and passed in explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOptions {
    pub test_split: f64,
    pub valid_split: f64,
    pub time_column_name: String,
    /// Only the count matters here: it is the depth of the grain directories.
    pub time_series_id_column_names: Vec<String>,
    pub output_root: PathBuf,
    pub write_options: WriteOptions,
}

impl ProcessorOptions {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            test_split: config.split.test_split,
            valid_split: config.split.valid_split,
            time_column_name: config.split.time_column_name.clone(),
            time_series_id_column_names: config.split.id_columns().to_vec(),
            output_root: config.output.root(),
            write_options: WriteOptions::with_row_group_size(config.output.parquet_row_group_size),
        }
    }

    pub fn grain_column_count(&self) -> usize {
        self.time_series_id_column_names.len()
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("test_split", self.test_split), ("valid_split", self.valid_split)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(BatchError::InvalidOptions(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        if self.time_column_name.is_empty() {
            return Err(BatchError::InvalidOptions(
                "time_column_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits the files of a mini-batch into train/valid/test outputs.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    options: ProcessorOptions,
    layout: OutputLayout,
}

impl BatchProcessor {
    pub fn new(options: ProcessorOptions) -> Result<Self> {
        options.validate()?;
        let layout = OutputLayout::new(&options.output_root, options.write_options.clone());
        Ok(Self { options, layout })
    }

    /// Process files in order, returning `"<grain>: done"` for each one split.
    ///
    /// Files with an unrecognized extension are skipped with a warning. Any
    /// other failure aborts the rest of the batch; outputs already written
    /// are left in place.
    pub fn process_mini_batch<P: AsRef<Path>>(&self, files: &[P]) -> Result<Vec<String>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if let Some(status) = self.process_file(file.as_ref())? {
                results.push(status);
            }
        }
        debug!(
            files = files.len(),
            processed = results.len(),
            "mini-batch complete"
        );
        Ok(results)
    }

    /// Run every mini-batch of `files`, `mini_batch_size` files at a time.
    pub fn run(&self, files: &[PathBuf], mini_batch_size: usize) -> Result<Vec<String>> {
        let mut results = Vec::with_capacity(files.len());
        for (number, batch) in crate::mini_batch::mini_batches(files, mini_batch_size).enumerate() {
            debug!(mini_batch = number, files = batch.len(), "processing mini-batch");
            results.extend(self.process_mini_batch(batch)?);
        }
        Ok(results)
    }

    fn process_file(&self, path: &Path) -> Result<Option<String>> {
        let Some(format) = InputFormat::from_path(path) else {
            let err = WriterError::unsupported_format(path, raw_extension(path));
            warn!(path = %path.display(), "{err}");
            return Ok(None);
        };

        let grain = GrainPath::from_file_path(path, self.options.grain_column_count())?;

        let time_column = self.options.time_column_name.as_str();
        let mut table = read_table(path, format, Some(time_column))?;
        let rows = table.num_rows();

        if self.options.test_split > 0.0 {
            table = self.hold_out(&table, self.options.test_split, SplitName::Test, &grain)?;
        }
        if self.options.valid_split > 0.0 {
            table = self.hold_out(&table, self.options.valid_split, SplitName::Valid, &grain)?;
        }
        self.layout.write_split(SplitName::Train, &grain, table.batch())?;

        info!(
            grain = %grain,
            rows,
            train_rows = table.num_rows(),
            path = %path.display(),
            "split file"
        );
        Ok(Some(format!("{grain}: done")))
    }

    /// Write the most recent `fraction` of `table` as `split`; return the rest.
    fn hold_out(
        &self,
        table: &Table,
        fraction: f64,
        split: SplitName,
        grain: &GrainPath,
    ) -> Result<Table> {
        let (head, tail) =
            split_for_forecasting(table, &self.options.time_column_name, fraction, &[])?;
        self.layout.write_split(split, grain, tail.batch())?;
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(root: &Path) -> ProcessorOptions {
        ProcessorOptions {
            test_split: 0.2,
            valid_split: 0.2,
            time_column_name: "date".to_string(),
            time_series_id_column_names: vec!["store".to_string()],
            output_root: root.to_path_buf(),
            write_options: WriteOptions::default(),
        }
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.valid_split = 1.0;
        let err = BatchProcessor::new(opts).unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));

        let mut opts = options(dir.path());
        opts.test_split = f64::NAN;
        assert!(BatchProcessor::new(opts).is_err());
    }

    #[test]
    fn test_rejects_empty_time_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.time_column_name.clear();
        assert!(BatchProcessor::new(opts).is_err());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = RuntimeConfig::default();
        config.split.time_column_name = "ts".to_string();
        config.split.time_series_id_column_names = Some(vec!["a".to_string(), "b".to_string()]);
        config.output.path = "/tmp/out".to_string();

        let opts = ProcessorOptions::from_config(&config);
        assert_eq!(opts.grain_column_count(), 2);
        assert_eq!(opts.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(opts.test_split, 0.2);
        assert_eq!(opts.write_options, WriteOptions::default());
    }

    #[test]
    fn test_unknown_extension_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let processor = BatchProcessor::new(options(dir.path())).unwrap();
        let status = processor
            .process_mini_batch(&[Path::new("in/A/readme.txt")])
            .unwrap();
        assert!(status.is_empty());
        assert!(!dir.path().join("train").exists());
    }
}
