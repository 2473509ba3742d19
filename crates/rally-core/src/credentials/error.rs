//! Credential validation errors.

use thiserror::Error;

/// Errors raised while building a credential bag.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// The payload does not conform to the schema of its kind.
    #[error("Invalid {kind} credentials: {}", .violations.join("; "))]
    SchemaValidation {
        kind: &'static str,
        violations: Vec<String>,
    },

    /// No credential kind is registered under this name.
    #[error("Unknown credential kind: {0}")]
    UnknownKind(String),
}
