//! Migration runner errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// `create_from_models` was asked to run against a stamped database.
    #[error("Database schema is already under version control (revision {0}); use upgrade instead")]
    AlreadyVersioned(String),

    /// The stamp or requested target is not part of the revision chain.
    #[error("Unknown revision '{0}'")]
    UnknownRevision(String),

    /// The target lies in the wrong direction for the requested operation.
    #[error("Cannot {operation} from {current} to {target}")]
    InvalidTarget {
        operation: &'static str,
        current: String,
        target: String,
    },

    /// The revision list is not a single linear chain.
    #[error("Broken revision chain: {0}")]
    BrokenChain(String),

    /// Existing rows could not be carried through a schema change.
    #[error("Invalid data in {table}: {reason}")]
    InvalidData { table: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
