// Configuration source loading.
//
// Priority order:
// 1. Environment variables (GRAINSPLIT_* prefix)
// 2. Config file path from GRAINSPLIT_CONFIG
// 3. Inline config content from GRAINSPLIT_CONFIG_CONTENT
// 4. Default config files (./grainsplit.toml, ./.grainsplit.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["./grainsplit.toml", "./.grainsplit.toml"];

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("GRAINSPLIT_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("GRAINSPLIT_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from GRAINSPLIT_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = read_config_file(path.as_ref())?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
pub fn load_or_default() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    // Try to load from file, but don't fail if not found
    if let Ok(Some(file_config)) = load_from_file() {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[split]
time_column_name = "ts"
valid_split = 0.0

[output]
path = "/tmp/grainsplit-out"
"#
        )
        .unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.split.time_column_name, "ts");
        assert_eq!(config.split.valid_split, 0.0);
        assert_eq!(config.output.path, "/tmp/grainsplit-out");
        assert_eq!(config.batch.mini_batch_size, 1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = read_config_file(Path::new("/nonexistent/grainsplit.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
