//! Argument lists for the two pipeline steps.
//!
//! An orchestrator runs `grainsplit partition` and then `grainsplit split` on
//! its workers; these builders render the arguments each step expects, in a
//! fixed flag order.

/// Arguments of the partition step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepArgs {
    pub partition_column_names: Vec<String>,
    pub output_path: String,
    pub partitioned_dataset_name: String,
    pub input_data_path: String,
    pub datastore_name: String,
}

impl StepArgs {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--partition_column_names".to_string()];
        args.extend(self.partition_column_names.iter().cloned());
        args.push("--output_path".to_string());
        args.push(self.output_path.clone());
        args.push("--partitioned_dataset_name".to_string());
        args.push(self.partitioned_dataset_name.clone());
        args.push("--input_data_path".to_string());
        args.push(self.input_data_path.clone());
        args.push("--datastore_name".to_string());
        args.push(self.datastore_name.clone());
        args
    }
}

/// Arguments of the split step (one per parallel-run worker)
#[derive(Debug, Clone, PartialEq)]
pub struct PrsArgs {
    pub time_column_name: String,
    pub time_series_id_column_names: Vec<String>,
    pub test_split: f64,
    pub valid_split: f64,
    /// Seconds the runtime waits for the first mini-batch to start
    pub first_task_creation_timeout: u64,
    pub logging_level: String,
}

impl PrsArgs {
    /// Defaults: 0.2 test, 0.2 valid, 2400s first-task timeout, `WARNING`.
    pub fn new(time_column_name: impl Into<String>, time_series_id_column_names: Vec<String>) -> Self {
        Self {
            time_column_name: time_column_name.into(),
            time_series_id_column_names,
            test_split: 0.2,
            valid_split: 0.2,
            first_task_creation_timeout: 2400,
            logging_level: "WARNING".to_string(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--time_column_name".to_string(),
            self.time_column_name.clone(),
            "--time_series_id_column_names".to_string(),
        ];
        args.extend(self.time_series_id_column_names.iter().cloned());
        args.extend([
            "--test_split".to_string(),
            self.test_split.to_string(),
            "--valid_split".to_string(),
            self.valid_split.to_string(),
            "--first_task_creation_timeout".to_string(),
            self.first_task_creation_timeout.to_string(),
            "--logging_level".to_string(),
            self.logging_level.clone(),
        ]);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_args_order() {
        let args = StepArgs {
            partition_column_names: vec!["Store".to_string(), "Brand".to_string()],
            output_path: "out".to_string(),
            partitioned_dataset_name: "oj_partitioned".to_string(),
            input_data_path: "oj/raw".to_string(),
            datastore_name: "workspaceblobstore".to_string(),
        };
        assert_eq!(
            args.to_args(),
            vec![
                "--partition_column_names",
                "Store",
                "Brand",
                "--output_path",
                "out",
                "--partitioned_dataset_name",
                "oj_partitioned",
                "--input_data_path",
                "oj/raw",
                "--datastore_name",
                "workspaceblobstore",
            ]
        );
    }

    #[test]
    fn test_prs_args_defaults() {
        let args = PrsArgs::new("WeekStarting", vec!["Store".to_string()]).to_args();
        assert_eq!(
            args,
            vec![
                "--time_column_name",
                "WeekStarting",
                "--time_series_id_column_names",
                "Store",
                "--test_split",
                "0.2",
                "--valid_split",
                "0.2",
                "--first_task_creation_timeout",
                "2400",
                "--logging_level",
                "WARNING",
            ]
        );
    }
}
