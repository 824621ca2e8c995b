//! Store location and logging settings.
//!
//! Values come from `KEEPSTOCK_*` environment variables and fall back to the
//! per-user data directory of the platform. Front ends may override any
//! field afterwards (the CLI does so from its flags).

use crate::logging::{LogLevel, LoggingError};
use directories::ProjectDirs;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "KEEPSTOCK_DB_PATH";
pub const ENV_LOG_DIR: &str = "KEEPSTOCK_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "KEEPSTOCK_LOG_LEVEL";

const DB_FILE_NAME: &str = "keepstock.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
}

#[derive(Debug)]
pub enum ConfigError {
    /// No home directory could be determined and no override was given.
    NoDataDir,
    RelativePath { variable: String, path: PathBuf },
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "could not locate a user data directory; set {ENV_DB_PATH} and {ENV_LOG_DIR}"
            ),
            Self::RelativePath { variable, path } => write!(
                f,
                "{variable} must be an absolute path, got `{}`",
                path.display()
            ),
            Self::InvalidLogLevel(err) => write!(f, "{ENV_LOG_LEVEL}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            _ => None,
        }
    }
}

impl StoreConfig {
    /// Resolves settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, which stands in for the environment.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_override = read(ENV_DB_PATH)
            .map(|value| absolute_override(ENV_DB_PATH, PathBuf::from(value)))
            .transpose()?;
        let log_override = read(ENV_LOG_DIR)
            .map(|value| absolute_override(ENV_LOG_DIR, PathBuf::from(value)))
            .transpose()?;
        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => LogLevel::parse(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => LogLevel::build_default(),
        };

        let (db_path, log_dir) = match (db_override, log_override) {
            (Some(db_path), Some(log_dir)) => (db_path, log_dir),
            (db_override, log_override) => {
                let data_dir = default_data_dir()?;
                (
                    db_override.unwrap_or_else(|| data_dir.join(DB_FILE_NAME)),
                    log_override.unwrap_or_else(|| data_dir.join(LOG_DIR_NAME)),
                )
            }
        };

        Ok(Self {
            db_path,
            log_dir,
            log_level,
        })
    }

    /// Replaces the database path; `source` names the setting in errors.
    pub fn with_db_path(mut self, path: &Path, source: &str) -> Result<Self, ConfigError> {
        self.db_path = absolute_override(source, path.to_path_buf())?;
        Ok(self)
    }

    /// Replaces the log directory; `source` names the setting in errors.
    pub fn with_log_dir(mut self, path: &Path, source: &str) -> Result<Self, ConfigError> {
        self.log_dir = absolute_override(source, path.to_path_buf())?;
        Ok(self)
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

fn absolute_override(variable: &str, path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(ConfigError::RelativePath {
            variable: variable.to_string(),
            path,
        })
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("com", "keepingstock", "keepingstock")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    fn absolute(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn overrides_are_used_verbatim() {
        let db = absolute("stock.sqlite3");
        let logs = absolute("stock-logs");
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, db.to_str().unwrap()),
            (ENV_LOG_DIR, logs.to_str().unwrap()),
            (ENV_LOG_LEVEL, "WARN"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, db);
        assert_eq!(config.log_dir, logs);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn relative_db_path_is_rejected() {
        let logs = absolute("stock-logs");
        let err = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "stock.sqlite3"),
            (ENV_LOG_DIR, logs.to_str().unwrap()),
        ]))
        .unwrap_err();

        match err {
            ConfigError::RelativePath { variable, path } => {
                assert_eq!(variable, ENV_DB_PATH);
                assert_eq!(path, Path::new("stock.sqlite3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_log_level_is_reported_with_variable_name() {
        let db = absolute("stock.sqlite3");
        let logs = absolute("stock-logs");
        let err = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, db.to_str().unwrap()),
            (ENV_LOG_DIR, logs.to_str().unwrap()),
            (ENV_LOG_LEVEL, "chatty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
        assert!(err.to_string().starts_with(ENV_LOG_LEVEL));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let db = absolute("stock.sqlite3");
        let logs = absolute("stock-logs");
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, db.to_str().unwrap()),
            (ENV_LOG_DIR, logs.to_str().unwrap()),
            (ENV_LOG_LEVEL, "   "),
        ]))
        .unwrap();

        assert_eq!(config.log_level, LogLevel::build_default());
    }

    #[test]
    fn flag_overrides_replace_resolved_values() {
        let db = absolute("stock.sqlite3");
        let logs = absolute("stock-logs");
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, db.to_str().unwrap()),
            (ENV_LOG_DIR, logs.to_str().unwrap()),
        ]))
        .unwrap();

        let other_db = absolute("other.sqlite3");
        let config = config
            .with_db_path(&other_db, "--db")
            .unwrap()
            .with_log_level(LogLevel::Error);
        assert_eq!(config.db_path, other_db);
        assert_eq!(config.log_level, LogLevel::Error);

        let err = config
            .with_log_dir(Path::new("relative/logs"), "--log-dir")
            .unwrap_err();
        assert!(err.to_string().contains("--log-dir"));
    }
}
