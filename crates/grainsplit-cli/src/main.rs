use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use grainsplit_cli::{PartitionRequest, PrsArgs, StepArgs};
use grainsplit_config::RuntimeConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Grain-aware chronological train/valid/test splitting of time-series files
#[derive(Parser)]
#[command(name = "grainsplit")]
#[command(version)]
#[command(about = "Grain-aware chronological train/valid/test splitting of time-series files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split partitioned files into train/valid/test by time
    Split(SplitArgs),
    /// Partition a dataset into one directory per grain
    Partition(PartitionArgs),
    /// Print the argument list of a pipeline step
    #[command(subcommand)]
    Args(ArgsCommand),
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Column holding the timestamp of each row
    #[arg(long = "time_column_name", value_name = "COLUMN")]
    time_column_name: Option<String>,

    /// Columns identifying a time series (zero or more)
    #[arg(long = "time_series_id_column_names", value_name = "COLUMN", num_args = 0..)]
    time_series_id_column_names: Option<Vec<String>>,

    /// Fraction of each grain held out for test
    #[arg(long = "test_split", value_name = "FRACTION")]
    test_split: Option<f64>,

    /// Fraction of the remainder held out for validation
    #[arg(long = "valid_split", value_name = "FRACTION")]
    valid_split: Option<f64>,

    /// Accepted for compatibility with parallel-run step arguments
    #[arg(long = "first_task_creation_timeout", value_name = "SECONDS")]
    first_task_creation_timeout: Option<u64>,

    /// Log level for this step (overrides --log-level)
    #[arg(long = "logging_level", value_name = "LEVEL")]
    logging_level: Option<String>,

    /// Output root for train/, valid/ and test/
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Files per mini-batch
    #[arg(long = "mini_batch_size", value_name = "N")]
    mini_batch_size: Option<usize>,

    /// Input files or partitioned directories
    #[arg(short, long = "input", value_name = "PATH", num_args = 1.., required = true)]
    input: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct PartitionArgs {
    /// Columns to partition by (zero or more)
    #[arg(long = "partition_column_names", value_name = "COLUMN", num_args = 0.., required = true)]
    partition_column_names: Vec<String>,

    /// Output directory (defaults to <datastore>/<partitioned_dataset_name>)
    #[arg(long = "output_path", value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Name of the partitioned dataset
    #[arg(long = "partitioned_dataset_name", value_name = "NAME")]
    partitioned_dataset_name: String,

    /// Input file or directory, relative to the datastore
    #[arg(long = "input_data_path", value_name = "PATH")]
    input_data_path: String,

    /// Datastore holding the input (a directory under datastore.root)
    #[arg(long = "datastore_name", value_name = "NAME")]
    datastore_name: String,
}

#[derive(Subcommand)]
enum ArgsCommand {
    /// Arguments for the split step
    Split {
        #[arg(long = "time_column_name", value_name = "COLUMN")]
        time_column_name: String,
        #[arg(long = "time_series_id_column_names", value_name = "COLUMN", num_args = 0..)]
        time_series_id_column_names: Vec<String>,
        #[arg(long = "test_split", default_value_t = 0.2)]
        test_split: f64,
        #[arg(long = "valid_split", default_value_t = 0.2)]
        valid_split: f64,
        #[arg(long = "first_task_creation_timeout", default_value_t = 2400)]
        first_task_creation_timeout: u64,
    },
    /// Arguments for the partition step
    Partition {
        #[arg(long = "partition_column_names", num_args = 0.., required = true)]
        partition_column_names: Vec<String>,
        #[arg(long = "output_path")]
        output_path: String,
        #[arg(long = "partitioned_dataset_name")]
        partitioned_dataset_name: String,
        #[arg(long = "input_data_path")]
        input_data_path: String,
        #[arg(long = "datastore_name")]
        datastore_name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Split(args) => run_split(&cli, args),
        Commands::Partition(args) => run_partition(&cli, args),
        Commands::Args(command) => {
            print_args(command);
            Ok(())
        }
    }
}

fn load_config(config_path: Option<&Path>) -> Result<RuntimeConfig> {
    match config_path {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => RuntimeConfig::load_or_default().context("Failed to load configuration"),
    }
}

fn run_split(cli: &Cli, args: &SplitArgs) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_split_overrides(&mut config, cli, args);
    config.validate()?;

    grainsplit_cli::init_tracing(&config.log);
    if let Some(timeout) = args.first_task_creation_timeout {
        debug!(timeout_secs = timeout, "first_task_creation_timeout has no effect on local runs");
    }

    for status in grainsplit_cli::run_split(&config, &args.input)? {
        println!("{status}");
    }
    Ok(())
}

fn apply_split_overrides(config: &mut RuntimeConfig, cli: &Cli, args: &SplitArgs) {
    if let Some(column) = &args.time_column_name {
        config.split.time_column_name = column.clone();
    }
    if let Some(columns) = &args.time_series_id_column_names {
        config.split.time_series_id_column_names = Some(columns.clone());
    }
    if let Some(fraction) = args.test_split {
        config.split.test_split = fraction;
    }
    if let Some(fraction) = args.valid_split {
        config.split.valid_split = fraction;
    }
    if let Some(output) = &args.output {
        config.output.path = output.to_string_lossy().to_string();
    }
    if let Some(size) = args.mini_batch_size {
        config.batch.mini_batch_size = size;
    }
    if let Some(level) = args.logging_level.as_ref().or(cli.log_level.as_ref()) {
        config.log.level = level.clone();
    }
}

fn run_partition(cli: &Cli, args: &PartitionArgs) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    config.validate()?;

    grainsplit_cli::init_tracing(&config.log);

    let request = PartitionRequest {
        partition_column_names: args.partition_column_names.clone(),
        output_path: args.output_path.clone(),
        partitioned_dataset_name: args.partitioned_dataset_name.clone(),
        input_data_path: args.input_data_path.clone(),
        datastore_name: args.datastore_name.clone(),
    };
    let manifest = grainsplit_cli::run_partition(&config, &request)?;

    println!(
        "Partitioned {} rows into {} files by {}",
        manifest.rows,
        manifest.files,
        manifest.partition_keys.join(", ")
    );
    Ok(())
}

fn print_args(command: &ArgsCommand) {
    let args = match command {
        ArgsCommand::Split {
            time_column_name,
            time_series_id_column_names,
            test_split,
            valid_split,
            first_task_creation_timeout,
        } => {
            let mut prs = PrsArgs::new(time_column_name, time_series_id_column_names.clone());
            prs.test_split = *test_split;
            prs.valid_split = *valid_split;
            prs.first_task_creation_timeout = *first_task_creation_timeout;
            prs.to_args()
        }
        ArgsCommand::Partition {
            partition_column_names,
            output_path,
            partitioned_dataset_name,
            input_data_path,
            datastore_name,
        } => StepArgs {
            partition_column_names: partition_column_names.clone(),
            output_path: output_path.clone(),
            partitioned_dataset_name: partitioned_dataset_name.clone(),
            input_data_path: input_data_path.clone(),
            datastore_name: datastore_name.clone(),
        }
        .to_args(),
    };

    for arg in args {
        println!("{arg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_split_args_parse_back() {
        let mut argv = vec!["grainsplit".to_string(), "split".to_string()];
        argv.extend(PrsArgs::new("date", vec!["country".to_string(), "state".to_string()]).to_args());
        argv.extend(["--input".to_string(), "data".to_string()]);

        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Split(args) = cli.command else {
            panic!("expected split command");
        };
        assert_eq!(args.time_column_name.as_deref(), Some("date"));
        assert_eq!(
            args.time_series_id_column_names,
            Some(vec!["country".to_string(), "state".to_string()])
        );
        assert_eq!(args.test_split, Some(0.2));
        assert_eq!(args.first_task_creation_timeout, Some(2400));
        assert_eq!(args.logging_level.as_deref(), Some("WARNING"));
        assert_eq!(args.input, vec![PathBuf::from("data")]);
    }

    #[test]
    fn test_rendered_partition_args_parse_back() {
        let mut argv = vec!["grainsplit".to_string(), "partition".to_string()];
        argv.extend(
            StepArgs {
                partition_column_names: vec!["store".to_string()],
                output_path: "out".to_string(),
                partitioned_dataset_name: "by_store".to_string(),
                input_data_path: "raw".to_string(),
                datastore_name: "local".to_string(),
            }
            .to_args(),
        );

        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Partition(args) = cli.command else {
            panic!("expected partition command");
        };
        assert_eq!(args.partition_column_names, vec!["store"]);
        assert_eq!(args.output_path, Some(PathBuf::from("out")));
        assert_eq!(args.datastore_name, "local");
    }

    #[test]
    fn test_empty_id_columns_allowed() {
        let cli = Cli::try_parse_from([
            "grainsplit",
            "split",
            "--time_column_name",
            "date",
            "--time_series_id_column_names",
            "--input",
            "a.csv",
        ])
        .unwrap();
        let Commands::Split(args) = cli.command else {
            panic!("expected split command");
        };
        assert_eq!(args.time_series_id_column_names, Some(Vec::new()));
    }

    #[test]
    fn test_partition_columns_accept_zero_values() {
        let cli = Cli::try_parse_from([
            "grainsplit",
            "partition",
            "--partition_column_names",
            "--partitioned_dataset_name",
            "by_nothing",
            "--input_data_path",
            "raw",
            "--datastore_name",
            "local",
        ])
        .unwrap();
        let Commands::Partition(args) = cli.command else {
            panic!("expected partition command");
        };
        assert!(args.partition_column_names.is_empty());

        assert!(Cli::try_parse_from([
            "grainsplit",
            "partition",
            "--partitioned_dataset_name",
            "by_nothing",
            "--input_data_path",
            "raw",
            "--datastore_name",
            "local",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "grainsplit",
            "--log-level",
            "debug",
            "split",
            "--time_column_name",
            "ts",
            "--test_split",
            "0.1",
            "--input",
            "a.csv",
        ])
        .unwrap();
        let Commands::Split(ref args) = cli.command else {
            panic!("expected split command");
        };

        let mut config = RuntimeConfig::default();
        config.split.valid_split = 0.3;
        apply_split_overrides(&mut config, &cli, args);

        assert_eq!(config.split.time_column_name, "ts");
        assert_eq!(config.split.test_split, 0.1);
        assert_eq!(config.split.valid_split, 0.3);
        assert_eq!(config.log.level, "debug");
    }
}
