//! Structured logging setup driven by [`LoggingConfig`].
//!
//! Respects `RUST_LOG` when set; otherwise the configured level applies
//! globally. File output replaces console output when enabled (the config
//! validator rejects configurations with no output at all).

use crate::config::LoggingConfig;
use crate::error::{GatepassError, Result};
use std::fs::OpenOptions;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from the given configuration.
///
/// # Errors
/// Returns `GatepassError::ConfigError` when the log file cannot be opened
/// or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if config.log_to_file {
        let path = config.log_file_path.as_deref().ok_or_else(|| {
            GatepassError::ConfigError("log_to_file is enabled without log_file_path".into())
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to open log file: {e}")))?;

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false);
        if config.json_format {
            builder
                .json()
                .try_init()
                .map_err(|e| GatepassError::ConfigError(format!("Failed to init logging: {e}")))?;
        } else {
            builder
                .try_init()
                .map_err(|e| GatepassError::ConfigError(format!("Failed to init logging: {e}")))?;
        }
        return Ok(());
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json_format {
        builder
            .json()
            .try_init()
            .map_err(|e| GatepassError::ConfigError(format!("Failed to init logging: {e}")))?;
    } else {
        builder
            .try_init()
            .map_err(|e| GatepassError::ConfigError(format!("Failed to init logging: {e}")))?;
    }
    Ok(())
}
