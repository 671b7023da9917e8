//! # Configuration Management
//!
//! Centralized configuration for the gateway identity transport.
//!
//! This module provides structured configuration for the envelope codec
//! (algorithm and key location), the account-linking feature, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - The default link-code timeout (5 minutes) keeps stolen codes short-lived
//! - Key material lives outside the config file; only its directory is named here

use crate::crypto::Algorithm;
use crate::error::{GatepassError, Result};
use crate::link::LinkBackend;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Default lifetime of a link verification code
pub const DEFAULT_CODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GatepassConfig {
    /// Envelope key configuration
    #[serde(default)]
    pub key: KeyConfig,

    /// Account-linking configuration
    #[serde(default)]
    pub linking: LinkingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatepassConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(algorithm) = std::env::var("GATEPASS_KEY_ALGORITHM") {
            config.key.algorithm = algorithm;
        }

        if let Ok(directory) = std::env::var("GATEPASS_KEY_DIRECTORY") {
            config.key.directory = PathBuf::from(directory);
        }

        if let Ok(enabled) = std::env::var("GATEPASS_LINKING_ENABLED") {
            if let Ok(val) = enabled.parse::<bool>() {
                config.linking.enabled = val;
            }
        }

        if let Ok(database) = std::env::var("GATEPASS_LINKING_DATABASE") {
            config.linking.database_path = PathBuf::from(database);
        }

        if let Ok(timeout) = std::env::var("GATEPASS_LINK_CODE_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.linking.code_timeout = Duration::from_millis(val);
            }
        }

        // Add more environment variables as needed

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| GatepassError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.key.validate());
        errors.extend(self.linking.validate());
        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatepassError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Envelope key configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyConfig {
    /// Envelope algorithm name ("symmetric", "signature", "sealed")
    pub algorithm: String,

    /// Directory holding the stored key halves
    pub directory: PathBuf,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            algorithm: String::from("symmetric"),
            directory: PathBuf::from("key"),
        }
    }
}

impl KeyConfig {
    /// Resolve the configured algorithm
    pub fn algorithm(&self) -> Result<Algorithm> {
        Algorithm::from_name(&self.algorithm).ok_or_else(|| {
            GatepassError::ConfigError(format!("Unknown algorithm: '{}'", self.algorithm))
        })
    }

    /// Validate key configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if Algorithm::from_name(&self.algorithm).is_none() {
            errors.push(format!(
                "Unknown algorithm: '{}' (expected 'symmetric', 'signature' or 'sealed')",
                self.algorithm
            ));
        }

        if self.directory.as_os_str().is_empty() {
            errors.push("Key directory cannot be empty".to_string());
        }

        errors
    }
}

/// Account-linking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkingConfig {
    /// Whether the linking feature is on at all
    pub enabled: bool,

    /// Whether unlinked players are rejected at handshake time
    pub require_link: bool,

    /// Whether this instance may create new link requests
    pub allow_create_requests: bool,

    /// Lifetime of a link verification code
    #[serde(with = "duration_serde")]
    pub code_timeout: Duration,

    /// Storage backend for requests and confirmed links
    pub backend: LinkBackend,

    /// Database file used by the sqlite backend
    pub database_path: PathBuf,

    /// Global (network-wide) linking mode
    #[serde(default)]
    pub global: GlobalLinkingConfig,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_link: false,
            allow_create_requests: true,
            code_timeout: DEFAULT_CODE_TIMEOUT,
            backend: LinkBackend::default(),
            database_path: PathBuf::from("linked-players.db"),
            global: GlobalLinkingConfig::default(),
        }
    }
}

impl LinkingConfig {
    /// Validate linking configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.enabled {
            if self.require_link {
                errors.push(
                    "require_link has no effect while linking is disabled".to_string(),
                );
            }
            return errors;
        }

        if self.backend == LinkBackend::None && !self.global.enabled {
            errors.push(
                "Linking is enabled but backend is 'none' and global mode is off".to_string(),
            );
        }

        if self.backend == LinkBackend::Sqlite && self.database_path.as_os_str().is_empty() {
            errors.push("Database path cannot be empty for the sqlite backend".to_string());
        }

        if self.code_timeout.as_secs() < 30 {
            errors.push("Link code timeout too short (minimum: 30s)".to_string());
        } else if self.code_timeout.as_secs() > 86_400 {
            errors.push("Link code timeout too long (maximum: 24h)".to_string());
        }

        errors.extend(self.global.validate());

        errors
    }
}

/// Global linking mode configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalLinkingConfig {
    /// Whether reads consult the central lookup service
    pub enabled: bool,

    /// Base URL of the lookup service
    pub lookup_url: String,
}

impl Default for GlobalLinkingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lookup_url: String::from("http://localhost:4000"),
        }
    }
}

impl GlobalLinkingConfig {
    /// Validate global linking configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.enabled {
            if self.lookup_url.is_empty() {
                errors.push("Global lookup URL cannot be empty".to_string());
            } else if !self.lookup_url.starts_with("http://")
                && !self.lookup_url.starts_with("https://")
            {
                errors.push(format!(
                    "Invalid global lookup URL: '{}' (expected http(s)://...)",
                    self.lookup_url
                ));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("gatepass"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Validate app name
        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        // Validate file logging configuration
        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                // Check if parent directory exists (if path is absolute)
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        // Validate at least one output is enabled
        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatepassConfig::default();
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GatepassConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed = GatepassConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed.key.algorithm, config.key.algorithm);
        assert_eq!(parsed.linking.code_timeout, config.linking.code_timeout);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let config = GatepassConfig::default_with_overrides(|config| {
            config.key.algorithm = "rot13".into();
        });
        assert!(!config.validate().is_empty());
        assert!(config.validate_strict().is_err());
    }

    #[test]
    fn test_backend_none_needs_global() {
        let config = GatepassConfig::default_with_overrides(|config| {
            config.linking.backend = crate::link::LinkBackend::None;
        });
        assert!(!config.validate().is_empty());

        let config = GatepassConfig::default_with_overrides(|config| {
            config.linking.backend = crate::link::LinkBackend::None;
            config.linking.global.enabled = true;
        });
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn test_code_timeout_bounds() {
        let config = GatepassConfig::default_with_overrides(|config| {
            config.linking.code_timeout = Duration::from_secs(5);
        });
        assert!(!config.validate().is_empty());
    }
}
