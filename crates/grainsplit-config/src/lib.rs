// grainsplit-config - Unified configuration for the split and partition steps
//
// Supports configuration from multiple sources:
// 1. Command-line flags (applied by the binary, highest priority)
// 2. Environment variables (GRAINSPLIT_* prefix)
// 3. Config file path from GRAINSPLIT_CONFIG env var
// 4. Config file contents from GRAINSPLIT_CONFIG_CONTENT env var
// 5. Default config file locations (./grainsplit.toml, ./.grainsplit.toml)
// 6. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub datastore: DatastoreConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Train/validation/test split parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default)]
    pub time_column_name: String,
    /// `None` until a config file, the environment or a flag sets it; an
    /// empty list means every file is a single grain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series_id_column_names: Option<Vec<String>>,
    #[serde(default = "default_split_fraction")]
    pub test_split: f64,
    #[serde(default = "default_split_fraction")]
    pub valid_split: f64,
}

fn default_split_fraction() -> f64 {
    0.2
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            time_column_name: String::new(),
            time_series_id_column_names: None,
            test_split: default_split_fraction(),
            valid_split: default_split_fraction(),
        }
    }
}

impl SplitConfig {
    /// Grain columns, empty when unset.
    pub fn id_columns(&self) -> &[String] {
        self.time_series_id_column_names.as_deref().unwrap_or_default()
    }

    /// Number of trailing directory segments that encode a file's grain.
    pub fn grain_column_count(&self) -> usize {
        self.id_columns().len()
    }

    /// Checks that must hold before any file is split.
    pub fn validate(&self) -> Result<()> {
        validation::validate_split_config(self)
    }
}

/// Mini-batch scheduling for the local split driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_mini_batch_size")]
    pub mini_batch_size: usize,
}

fn default_mini_batch_size() -> usize {
    1
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mini_batch_size: default_mini_batch_size(),
        }
    }
}

/// Where split results land and how they are encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_parquet_row_group_size() -> usize {
    32 * 1024
}

impl OutputConfig {
    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            parquet_row_group_size: default_parquet_row_group_size(),
        }
    }
}

/// Local stand-in for named datastores: each name is a directory under `root`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    pub root: String,
}

impl DatastoreConfig {
    /// Resolve a datastore name to its directory.
    pub fn resolve(&self, name: &str) -> PathBuf {
        PathBuf::from(&self.root).join(name)
    }
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            root: "./datastores".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults.
    /// Does not fail if a config file is missing or unreadable.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Parse a TOML document layered over the defaults (no env, no files).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file_config: RuntimeConfig =
            toml::from_str(content).context("Failed to parse config content")?;
        let mut config = RuntimeConfig::default();
        config.merge(file_config);
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.split = other.split;
        self.batch = other.batch;
        self.output = other.output;
        self.datastore = other.datastore;
        self.log = other.log;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
