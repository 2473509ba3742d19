//! Deployment repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Deployment, DeploymentStatus, DeploymentUpdate, NewDeployment};

/// Repository for deployments.
///
/// # Design Rules
///
/// - Constraint: unique `name` and unique `uuid` across all deployments
/// - Lookups accept a name or a UUID; the name wins when both could match
/// - A deployment with resources cannot be deleted
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    /// Persist a new deployment.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` carrying the name if the name is taken
    async fn create(&self, deployment: NewDeployment) -> Result<Deployment, RepositoryError>;

    /// Get a deployment by name, falling back to UUID.
    async fn get(&self, deployment: &str) -> Result<Deployment, RepositoryError>;

    /// Merge `update` onto the deployment found by name or UUID.
    ///
    /// # Errors
    ///
    /// - `NotFound` if neither name nor UUID matches
    /// - `AlreadyExists` if the new name collides with another deployment
    async fn update(
        &self,
        deployment: &str,
        update: DeploymentUpdate,
    ) -> Result<Deployment, RepositoryError>;

    /// Delete a deployment by UUID.
    ///
    /// # Errors
    ///
    /// - `Busy` if any resource still references it; nothing is removed
    /// - `NotFound` if no deployment has this UUID
    async fn delete(&self, uuid: &str) -> Result<(), RepositoryError>;

    /// List deployments under `parent_uuid` (top-level ones when `None`),
    /// optionally narrowed by status and name.
    async fn list(
        &self,
        status: Option<DeploymentStatus>,
        parent_uuid: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Deployment>, RepositoryError>;
}
