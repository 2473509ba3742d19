//! CLI-specific error types and mappings.
//!
//! Every library error is folded into [`CliError`], which knows its exit
//! code and renders the message shown on stderr.

use rally_core::{ConfigError, CoreError};
use rally_db::{EngineError, MigrationError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or target validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The schema could not be moved to the requested state.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl CliError {
    /// Map error to appropriate exit code (see sysexits.h).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 64, // EX_USAGE
            Self::Config(_) => 78,    // EX_CONFIG
            Self::Database(_) => 69,  // EX_UNAVAILABLE
            Self::Migration(_) => 65, // EX_DATAERR
        }
    }
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::UnknownRevision(_) | MigrationError::InvalidTarget { .. } => {
                Self::Arguments(err.to_string())
            }
            MigrationError::Storage(e) => Self::Database(e.to_string()),
            MigrationError::AlreadyVersioned(_)
            | MigrationError::BrokenChain(_)
            | MigrationError::InvalidData { .. } => Self::Migration(err.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Config(e) => e.into(),
            EngineError::InvalidUrl { .. } => Self::Config(err.to_string()),
            EngineError::Connect(e) => Self::Database(e.to_string()),
            EngineError::NoRuntime => Self::Database(err.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Repository(e) => Self::Database(e.to_string()),
            CoreError::Credentials(e) => Self::Arguments(e.to_string()),
            CoreError::Configuration(e) => e.into(),
            CoreError::Validation(msg) => Self::Arguments(msg),
            CoreError::Internal(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            CliError::Arguments(String::new()).exit_code(),
            CliError::Config(String::new()).exit_code(),
            CliError::Database(String::new()).exit_code(),
            CliError::Migration(String::new()).exit_code(),
        ];
        for (i, code) in codes.iter().enumerate() {
            assert!(!codes[i + 1..].contains(code));
        }
    }

    #[test]
    fn test_migration_errors_map_by_cause() {
        let unknown: CliError = MigrationError::UnknownRevision("abc".into()).into();
        assert!(matches!(unknown, CliError::Arguments(ref m) if m.contains("abc")));

        let versioned: CliError = MigrationError::AlreadyVersioned("abc".into()).into();
        assert_eq!(versioned.exit_code(), 65);
    }

    #[test]
    fn test_bad_config_maps_to_config() {
        let err: CliError = EngineError::Config(ConfigError::InvalidValue {
            name: "RALLY_DB_MAX_CONNECTIONS",
            value: "many".into(),
        })
        .into();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_missing_runtime_maps_to_database() {
        let err: CliError = EngineError::NoRuntime.into();
        assert_eq!(err.exit_code(), 69);
    }
}
