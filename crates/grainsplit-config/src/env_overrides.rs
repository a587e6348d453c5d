use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "GRAINSPLIT_";

/// Abstraction over environment-variable lookups so tests (and embedding
/// runtimes) can supply their own source of overrides.
pub trait EnvSource {
    /// Get a variable by its key, without the GRAINSPLIT_ prefix.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Split parameters
    if let Some(name) = get_env_string(env, "TIME_COLUMN_NAME") {
        config.split.time_column_name = name;
    }
    if let Some(names) = get_env_string(env, "TIME_SERIES_ID_COLUMN_NAMES") {
        config.split.time_series_id_column_names = Some(parse_list(&names));
    }
    if let Some(val) = get_env_f64(env, "TEST_SPLIT")? {
        config.split.test_split = val;
    }
    if let Some(val) = get_env_f64(env, "VALID_SPLIT")? {
        config.split.valid_split = val;
    }

    // Batch configuration
    if let Some(val) = get_env_usize(env, "MINI_BATCH_SIZE")? {
        config.batch.mini_batch_size = val;
    }

    // Output configuration
    if let Some(path) = get_env_string(env, "OUTPUT_PATH") {
        config.output.path = path;
    }
    if let Some(val) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.output.parquet_row_group_size = val;
    }

    // Datastore
    if let Some(root) = get_env_string(env, "DATASTORE_ROOT") {
        config.datastore.root = root;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid GRAINSPLIT_LOG_FORMAT value")?;
    }

    Ok(())
}

/// Comma-separated list; blank entries are dropped so "" means no columns.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_f64<E: EnvSource>(env: &E, key: &str) -> Result<Option<f64>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn overrides_split_and_output() {
        let env = MapEnv(HashMap::from([
            ("TIME_COLUMN_NAME", "date"),
            ("TIME_SERIES_ID_COLUMN_NAMES", "country, state"),
            ("TEST_SPLIT", "0.1"),
            ("VALID_SPLIT", "0"),
            ("MINI_BATCH_SIZE", "8"),
            ("OUTPUT_PATH", "/tmp/out"),
            ("LOG_FORMAT", "json"),
        ]));

        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.split.time_column_name, "date");
        assert_eq!(
            config.split.time_series_id_column_names,
            Some(vec!["country".to_string(), "state".to_string()])
        );
        assert_eq!(config.split.test_split, 0.1);
        assert_eq!(config.split.valid_split, 0.0);
        assert_eq!(config.batch.mini_batch_size, 8);
        assert_eq!(config.output.path, "/tmp/out");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn empty_id_column_list_means_single_grain() {
        let env = MapEnv(HashMap::from([("TIME_SERIES_ID_COLUMN_NAMES", "")]));
        let mut config = RuntimeConfig::default();
        config.split.time_series_id_column_names = Some(vec!["store".to_string()]);

        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.split.time_series_id_column_names, Some(Vec::new()));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let env = MapEnv(HashMap::from([("TEST_SPLIT", "a fifth")]));
        let mut config = RuntimeConfig::default();

        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("GRAINSPLIT_TEST_SPLIT"));
    }
}
