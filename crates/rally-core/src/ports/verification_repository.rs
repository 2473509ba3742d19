//! Verification repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Verification, VerificationResult, VerificationStatus, VerificationUpdate};

/// Repository for verification runs and their results.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Start a verification for a deployment, in `init` status.
    async fn create(&self, deployment_uuid: &str) -> Result<Verification, RepositoryError>;

    /// Get a verification by UUID.
    async fn get(&self, uuid: &str) -> Result<Verification, RepositoryError>;

    /// Merge `update` onto the verification and return the updated row.
    async fn update(
        &self,
        uuid: &str,
        update: VerificationUpdate,
    ) -> Result<Verification, RepositoryError>;

    /// List verifications, optionally filtered by status.
    async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, RepositoryError>;

    /// Delete a verification by UUID.
    async fn delete(&self, uuid: &str) -> Result<(), RepositoryError>;

    /// Store the result payload of a verification.
    async fn create_result(
        &self,
        verification_uuid: &str,
        data: serde_json::Value,
    ) -> Result<VerificationResult, RepositoryError>;

    /// Get the result payload of a verification.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if no result was stored yet.
    async fn get_result(
        &self,
        verification_uuid: &str,
    ) -> Result<VerificationResult, RepositoryError>;
}
