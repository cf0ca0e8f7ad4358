//! Configuration management
//!
//! Defaults, an optional toml file, then environment overrides, in that
//! order. Environment variables follow the pattern STUDYHALL_<SECTION>_<KEY>,
//! e.g. STUDYHALL_STORAGE_DB_PATH=/var/lib/studyhall/content.db.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
}

/// Content database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the sqlite database file
    pub db_path: PathBuf,
}

/// Attachment byte storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory holding stored attachment bytes
    pub root: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON lines
    pub json_format: bool,

    /// Include the target module in each line
    pub with_target: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./studyhall.db"),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./files"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Config {
    /// Defaults, then the file at `path` when given, then the environment
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a toml file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = env::var("STUDYHALL_STORAGE_DB_PATH") {
            self.storage.db_path = PathBuf::from(path);
        }
        if let Ok(root) = env::var("STUDYHALL_FILES_ROOT") {
            self.files.root = PathBuf::from(root);
        }
        if let Ok(level) = env::var("STUDYHALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("STUDYHALL_LOG_JSON") {
            self.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("invalid JSON flag: {}", e)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.db_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "storage.db_path must not be empty".to_string(),
            ));
        }
        if self.files.root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "files.root must not be empty".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "invalid log level: {}",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// The logging section as a [`crate::logging::LogConfig`]
    pub fn log_config(&self) -> crate::logging::LogConfig {
        crate::logging::LogConfig {
            level: self.logging.level.clone(),
            json_format: self.logging.json_format,
            with_target: self.logging.with_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\ndb_path = \"/tmp/content.db\"\n\n[logging]\nlevel = \"debug\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/content.db"));
        assert_eq!(config.logging.level, "debug");
        // Untouched sections fall back to their defaults.
        assert_eq!(config.files.root, PathBuf::from("./files"));
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage = 12").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            Config::from_file("/nonexistent/studyhall.toml"),
            Err(ConfigError::FileRead(_))
        ));
    }
}
