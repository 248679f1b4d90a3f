//! Configuration System
//!
//! Handles loading the application configuration from files and environment
//! variables. Supports TOML config files and environment variable overrides.
//!
//! The deployment-produced backend outputs document is a separate input, see
//! [`crate::bootstrap::BackendOutputs`]; this file only says where to find it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Managed backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Path of the deployment outputs document
    #[serde(default = "default_outputs_path")]
    pub outputs_path: PathBuf,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_outputs_path() -> PathBuf {
    PathBuf::from("backend_outputs.json")
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            outputs_path: default_outputs_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<(Self, LoadReport), ConfigError> {
        let mut config = Self::load(path)?;
        let ignored = config.apply_env_overrides();
        Ok((
            config,
            LoadReport {
                source: Some(path.to_path_buf()),
                skipped: Vec::new(),
                ignored,
            },
        ))
    }

    /// Load from default locations or environment.
    ///
    /// Nothing is logged here since this runs before logging is set up;
    /// call [`LoadReport::log`] once it is.
    pub fn load_default() -> (Self, LoadReport) {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("tally").join("config.toml")),
            Some(PathBuf::from("/etc/tally/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths, |key| std::env::var(key).ok())
    }

    /// Load the first candidate file that exists and parses, falling back to
    /// defaults, then apply overrides from `lookup`
    fn load_first<F>(paths: &[PathBuf], lookup: F) -> (Self, LoadReport)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut report = LoadReport::default();
        let mut config = Config::default();

        for path in paths.iter().filter(|path| path.exists()) {
            match Self::load(path) {
                Ok(loaded) => {
                    config = loaded;
                    report.source = Some(path.clone());
                    break;
                }
                Err(e) => report.skipped.push(e),
            }
        }

        report.ignored = config.apply_overrides(lookup);
        (config, report)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Returns a note for each value
    /// that could not be used.
    fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ignored = Vec::new();

        if let Some(path) = lookup("TALLY_OUTPUTS") {
            self.backend.outputs_path = PathBuf::from(path);
        }
        if let Some(timeout) = lookup("TALLY_REQUEST_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.backend.request_timeout_secs = secs,
                Err(_) => ignored.push(format!(
                    "Ignoring TALLY_REQUEST_TIMEOUT_SECS: not a number of seconds: {}",
                    timeout
                )),
            }
        }

        if let Some(level) = lookup("TALLY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TALLY_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.logging.format = format,
                Err(e) => ignored.push(format!("Ignoring TALLY_LOG_FORMAT: {}", e)),
            }
        }

        ignored
    }
}

/// How a configuration was assembled
#[derive(Debug, Default)]
pub struct LoadReport {
    /// File the settings came from; `None` when only defaults were used
    pub source: Option<PathBuf>,
    /// Candidate files that exist but failed to load
    pub skipped: Vec<ConfigError>,
    /// Environment overrides that were not applied
    pub ignored: Vec<String>,
}

impl LoadReport {
    /// Log the outcome. Call after the subscriber is installed.
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Skipped config file: {}", error);
        }
        for note in &self.ignored {
            tracing::warn!("{}", note);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tally Configuration
#
# Environment variables override these settings:
# - TALLY_OUTPUTS
# - TALLY_REQUEST_TIMEOUT_SECS
# - TALLY_LOG_LEVEL
# - TALLY_LOG_FORMAT

[backend]
# Deployment outputs document produced by backend provisioning
outputs_path = "backend_outputs.json"

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
