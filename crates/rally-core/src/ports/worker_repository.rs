//! Worker repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewWorker, Worker};

/// Repository for worker registrations.
///
/// Constraint: unique `hostname`. Registering a hostname twice is a
/// conflict, never an overwrite.
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    /// Register a worker with a fresh heartbeat.
    async fn register(&self, worker: NewWorker) -> Result<Worker, RepositoryError>;

    /// Get a worker by hostname.
    async fn get(&self, hostname: &str) -> Result<Worker, RepositoryError>;

    /// Remove a worker registration.
    async fn unregister(&self, hostname: &str) -> Result<(), RepositoryError>;

    /// Touch the heartbeat timestamp only.
    ///
    /// This is a narrow, first-class method: nothing else on the row changes.
    /// Returns `Err(RepositoryError::NotFound)` when no row was affected.
    async fn update(&self, hostname: &str) -> Result<(), RepositoryError>;
}
