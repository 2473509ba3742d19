//! Resource repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewResource, Resource};

/// Repository for deployment resources.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Persist a new resource.
    async fn create(&self, resource: NewResource) -> Result<Resource, RepositoryError>;

    /// All resources of a deployment, optionally filtered by provider and type.
    async fn list(
        &self,
        deployment_uuid: &str,
        provider_name: Option<&str>,
        resource_type: Option<&str>,
    ) -> Result<Vec<Resource>, RepositoryError>;

    /// Delete a resource by id.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if the resource doesn't exist.
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}
