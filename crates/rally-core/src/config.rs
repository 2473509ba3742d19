//! Database connection configuration.
//!
//! Resolution order for every setting:
//! 1. An explicit value set by the caller
//! 2. The `RALLY_*` environment variables
//! 3. Built-in defaults (a `rally.sqlite` file in the user data directory)

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DATABASE_URL_ENV: &str = "RALLY_DATABASE_URL";
pub const MAX_CONNECTIONS_ENV: &str = "RALLY_DB_MAX_CONNECTIONS";
pub const BUSY_TIMEOUT_ENV: &str = "RALLY_DB_BUSY_TIMEOUT_SECS";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create the data directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// An environment variable holds a value that does not parse.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Path to the default database file.
///
/// The `rally/` directory under the user data directory is created if
/// it doesn't exist.
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_local_dir()
        .ok_or(ConfigError::NoDataDir)?
        .join("rally");

    fs::create_dir_all(&data_dir).map_err(|e| ConfigError::CreateFailed {
        path: data_dir.clone(),
        reason: e.to_string(),
    })?;

    Ok(data_dir.join("rally.sqlite"))
}

/// Connection settings for the process-wide engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL, e.g. `sqlite:///var/lib/rally/rally.sqlite`.
    pub url: String,
    pub max_connections: u32,
    /// How long a connection waits on a locked database.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Configuration for a file path, created on first connect.
    pub fn for_path(path: &std::path::Path) -> Self {
        Self::new(format!("sqlite://{}?mode=rwc", path.display()))
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(DATABASE_URL_ENV) {
            Some(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::for_path(&default_database_path()?),
        };

        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            config.max_connections = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: MAX_CONNECTIONS_ENV,
                        value: raw,
                    });
                }
            };
        }

        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: BUSY_TIMEOUT_ENV,
                    value: raw.clone(),
                })?;
            config.busy_timeout = Duration::from_secs(secs);
        }

        tracing::debug!(url = %config.url, "resolved database configuration");
        Ok(config)
    }

    /// Replace the URL, keeping the pool settings.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_values_are_applied() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (MAX_CONNECTIONS_ENV, "2"),
            (BUSY_TIMEOUT_ENV, "30"),
        ]))
        .unwrap();

        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let err = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (MAX_CONNECTIONS_ENV, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: MAX_CONNECTIONS_ENV, .. }
        ));

        let err = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "sqlite::memory:"),
            (MAX_CONNECTIONS_ENV, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_default_path_ends_with_rally_sqlite() {
        let path = default_database_path().unwrap();
        assert!(path.to_string_lossy().ends_with("rally.sqlite"));
    }

    #[test]
    fn test_for_path_builds_create_mode_url() {
        let config = DatabaseConfig::for_path(std::path::Path::new("/tmp/r.sqlite"));
        assert_eq!(config.url, "sqlite:///tmp/r.sqlite?mode=rwc");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
