// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_fractions(&config.split)?;
    validate_batch_config(&config.batch)?;
    validate_output_config(&config.output)?;

    if config.datastore.root.is_empty() {
        bail!("datastore.root must not be empty");
    }

    Ok(())
}

/// Full check for the split step: fractions plus a usable time column.
pub fn validate_split_config(config: &SplitConfig) -> Result<()> {
    validate_fractions(config)?;

    if config.time_column_name.trim().is_empty() {
        bail!("split.time_column_name is required");
    }

    let Some(id_columns) = &config.time_series_id_column_names else {
        bail!("split.time_series_id_column_names is required (an empty list is allowed)");
    };

    if id_columns.iter().any(|name| name.trim().is_empty())
    {
        bail!("split.time_series_id_column_names must not contain empty names");
    }

    if id_columns.contains(&config.time_column_name)
    {
        bail!(
            "split.time_column_name '{}' cannot also be a time series id column",
            config.time_column_name
        );
    }

    Ok(())
}

fn validate_fractions(config: &SplitConfig) -> Result<()> {
    for (name, value) in [
        ("split.test_split", config.test_split),
        ("split.valid_split", config.valid_split),
    ] {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            bail!("{} must be in [0, 1), got {}", name, value);
        }
    }

    // Validation is carved out of what the test split leaves behind
    let train_share = (1.0 - config.test_split) * (1.0 - config.valid_split);
    if train_share < 0.25 {
        warn!(
            test_split = config.test_split,
            valid_split = config.valid_split,
            train_share,
            "test and validation splits leave less than a quarter of each grain for training"
        );
    }

    Ok(())
}

fn validate_batch_config(config: &BatchConfig) -> Result<()> {
    if config.mini_batch_size == 0 {
        bail!("batch.mini_batch_size must be greater than 0");
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<()> {
    if config.path.is_empty() {
        bail!("output.path must not be empty");
    }

    if config.parquet_row_group_size == 0 {
        bail!("output.parquet_row_group_size must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(time: &str, test: f64, valid: f64) -> SplitConfig {
        SplitConfig {
            time_column_name: time.to_string(),
            time_series_id_column_names: Some(vec!["store".to_string()]),
            test_split: test,
            valid_split: valid,
        }
    }

    #[test]
    fn test_validate_fractions() {
        assert!(validate_split_config(&split("date", 0.2, 0.2)).is_ok());
        assert!(validate_split_config(&split("date", 0.0, 0.0)).is_ok());
        assert!(validate_split_config(&split("date", 1.0, 0.2)).is_err());
        assert!(validate_split_config(&split("date", 0.2, -0.1)).is_err());
        assert!(validate_split_config(&split("date", f64::NAN, 0.2)).is_err());
    }

    #[test]
    fn test_validate_time_column() {
        assert!(validate_split_config(&split("", 0.2, 0.2)).is_err());
        assert!(validate_split_config(&split("store", 0.2, 0.2)).is_err());
    }

    #[test]
    fn test_validate_id_columns_required() {
        let mut config = split("date", 0.2, 0.2);
        config.time_series_id_column_names = None;
        let err = validate_split_config(&config).unwrap_err();
        assert!(err.to_string().contains("time_series_id_column_names"));

        config.time_series_id_column_names = Some(Vec::new());
        assert!(validate_split_config(&config).is_ok());
    }

    #[test]
    fn test_validate_batch_and_output() {
        let mut config = RuntimeConfig::default();
        config.batch.mini_batch_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = RuntimeConfig::default();
        config.output.parquet_row_group_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = RuntimeConfig::default();
        config.output.path = String::new();
        assert!(validate_config(&config).is_err());
    }
}
