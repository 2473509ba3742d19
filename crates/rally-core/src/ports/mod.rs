//! Port definitions (trait abstractions) for persistence.
//!
//! Ports define the interfaces that callers expect from the storage layer.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - One method per entity operation; filter, fetch-or-fail, mutate-or-return
//! - Lookups by identifier fail with a typed error instead of returning `None`
//! - List operations return an empty `Vec` when nothing matches

pub mod deployment_repository;
pub mod resource_repository;
pub mod task_repository;
pub mod verification_repository;
pub mod worker_repository;

use std::sync::Arc;
use thiserror::Error;

pub use deployment_repository::DeploymentRepository;
pub use resource_repository::ResourceRepository;
pub use task_repository::TaskRepository;
pub use verification_repository::VerificationRepository;
pub use worker_repository::WorkerRepository;

use crate::credentials::CredentialsError;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Deployment,
    Resource,
    Verification,
    VerificationResult,
    Worker,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Deployment => "deployment",
            Self::Resource => "resource",
            Self::Verification => "verification",
            Self::VerificationResult => "verification result",
            Self::Worker => "worker",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and carries enough context to render a message without re-querying.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row matched the identifier.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// A row with the same unique key already exists.
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: EntityKind, key: String },

    /// The row exists but its status does not satisfy the operation.
    #[error("{kind} '{id}' is in status '{actual}', expected '{required}'")]
    InvalidStatus {
        kind: EntityKind,
        id: String,
        required: String,
        actual: String,
    },

    /// The row still has live dependents and cannot be removed.
    #[error("{kind} '{id}' is busy: dependent rows still exist")]
    Busy { kind: EntityKind, id: String },

    /// Storage backend error (database, connection, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn already_exists(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.into(),
        }
    }

    pub fn busy(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::Busy {
            kind,
            id: id.into(),
        }
    }

    /// True for `NotFound` errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Container for all repository trait objects.
///
/// This struct provides a consistent way to hand repositories to callers
/// without coupling them to concrete implementations.
#[derive(Clone)]
pub struct Repos {
    pub tasks: Arc<dyn TaskRepository>,
    pub deployments: Arc<dyn DeploymentRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub workers: Arc<dyn WorkerRepository>,
}

impl Repos {
    /// Create a new Repos container.
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        deployments: Arc<dyn DeploymentRepository>,
        resources: Arc<dyn ResourceRepository>,
        verifications: Arc<dyn VerificationRepository>,
        workers: Arc<dyn WorkerRepository>,
    ) -> Self {
        Self {
            tasks,
            deployments,
            resources,
            verifications,
            workers,
        }
    }
}

/// Core error type for semantic domain errors.
///
/// Adapters should map this to their own error types (CLI exit codes, etc.).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Credential payload rejected.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// Configuration error.
    #[error(transparent)]
    Configuration(#[from] crate::config::ConfigError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = RepositoryError::not_found(EntityKind::Deployment, "dep-a");
        assert_eq!(err.to_string(), "deployment 'dep-a' not found");
        assert!(err.is_not_found());

        let err = RepositoryError::InvalidStatus {
            kind: EntityKind::Task,
            id: "t-1".to_string(),
            required: "finished".to_string(),
            actual: "running".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "task 't-1' is in status 'running', expected 'finished'"
        );

        let err = RepositoryError::already_exists(EntityKind::Worker, "host-1");
        assert_eq!(err.to_string(), "worker 'host-1' already exists");
    }

    #[test]
    fn test_core_error_wraps_repository_error() {
        let err: CoreError = RepositoryError::busy(EntityKind::Deployment, "d-1").into();
        assert!(matches!(
            err,
            CoreError::Repository(RepositoryError::Busy { .. })
        ));
    }
}
