//! Logging setup driven by environment variables.
//!
//! - `SG_LOG_FORMAT`: `compact` (default) or `json`
//! - `SG_LOG_LEVEL`: filter directive, falls back to `RUST_LOG`, then `info`
//!
//! `--debug` forces the `debug` level. Output goes to stderr so generated
//! YAML can be piped from stdout.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env(debug: bool) -> Self {
        let format = match std::env::var("SG_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        let level = if debug {
            "debug".to_string()
        } else {
            std::env::var("SG_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string())
        };
        Self { format, level }
    }
}

pub fn init_logging(debug: bool) -> Result<()> {
    let config = LoggingConfig::from_env(debug);
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("invalid log filter '{}': {e}", config.level))?;

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        let c = LoggingConfig::from_env(true);
        assert_eq!(c.level, "debug");
    }
}
