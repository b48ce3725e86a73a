//! Store configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe where the calendar database lives and how to log.
//! - Open the configured database and logging backend.
//!
//! # Invariants
//! - `database_path` is never empty after loading.
//! - `log_level` is normalized to `trace|debug|info|warn|error`.

use crate::db::{open_db, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Runtime configuration of a calendar store deployment.
///
/// ```toml
/// database_path = "/var/lib/calstore/calendars.sqlite3"
/// log_level = "info"
/// log_dir = "/var/log/calstore"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    #[serde(default = "default_level")]
    pub log_level: String,
    /// File logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl StoreConfig {
    /// Configuration for `database_path` with default logging settings.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            log_level: default_level(),
            log_dir: None,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.normalized()
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Opens the configured database with migrations applied.
    pub fn open_database(&self) -> DbResult<Connection> {
        open_db(&self.database_path)
    }

    /// Starts file logging when `log_dir` is set.
    ///
    /// Returns whether logging was started.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(log_dir) => init_logging(&self.log_level, log_dir).map(|()| true),
            None => Ok(false),
        }
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path cannot be empty".to_string(),
            ));
        }
        self.log_level = normalize_level(&self.log_level)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?
            .to_string();
        Ok(self)
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = StoreConfig::from_toml_str("database_path = \"/tmp/cal.sqlite3\"").unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/cal.sqlite3"));
        assert!(config.log_dir.is_none());
        assert_eq!(config, StoreConfig::new("/tmp/cal.sqlite3"));
    }

    #[test]
    fn normalizes_log_level() {
        let config = StoreConfig::from_toml_str(
            "database_path = \"cal.sqlite3\"\nlog_level = \"WARNING\"\nlog_dir = \"/var/log/cal\"",
        )
        .unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/cal")));
    }

    #[test]
    fn rejects_unknown_keys_bad_levels_and_empty_paths() {
        assert!(matches!(
            StoreConfig::from_toml_str("database_path = \"a\"\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("database_path = \"a\"\nlog_level = \"loud\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("database_path = \"\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_reads_file_and_opens_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("calendars.sqlite3");
        let config_path = dir.path().join("calstore.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path = {:?}", db_path.to_str().unwrap()).unwrap();

        let config = StoreConfig::load(&config_path).unwrap();
        assert_eq!(config.database_path, db_path);
        assert!(!config.init_logging().unwrap());
        config.open_database().unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = StoreConfig::load("/nonexistent/calstore.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
