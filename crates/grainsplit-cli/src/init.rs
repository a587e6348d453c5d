// Logging/tracing setup

use std::io::IsTerminal;

use grainsplit_config::{LogConfig, LogFormat};

/// Map a level name to a tracing filter directive.
///
/// Accepts tracing names and the uppercase names pipeline steps pass along
/// (`WARNING`, `CRITICAL`, ...). Anything else is returned unchanged so full
/// `RUST_LOG` style directives still work.
pub fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "critical" | "fatal" | "error" => "error".to_string(),
        "warning" | "warn" => "warn".to_string(),
        "info" => "info".to_string(),
        "debug" => "debug".to_string(),
        "notset" | "trace" => "trace".to_string(),
        _ => level.trim().to_string(),
    }
}

/// Initialize tracing/logging from the log section of the config.
///
/// Logs go to stderr; stdout is reserved for command output.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(normalize_level(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(std::io::stderr().is_terminal()),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("WARNING"), "warn");
        assert_eq!(normalize_level("Critical"), "error");
        assert_eq!(normalize_level("debug"), "debug");
        assert_eq!(normalize_level("NOTSET"), "trace");
        assert_eq!(
            normalize_level("grainsplit_batch=debug,info"),
            "grainsplit_batch=debug,info"
        );
    }
}
