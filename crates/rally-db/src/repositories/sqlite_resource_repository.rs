//! `SQLite` implementation of the `ResourceRepository` trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use rally_core::{EntityKind, NewResource, RepositoryError, Resource, ResourceRepository};

use super::row_mappers::{
    RESOURCE_COLUMNS, ResourceRow, Violation, collect, encode_json, storage, violation,
};

/// `SQLite` implementation of the `ResourceRepository` trait.
pub struct SqliteResourceRepository {
    pool: SqlitePool,
}

impl SqliteResourceRepository {
    /// Create a new `SQLite` resource repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository for SqliteResourceRepository {
    async fn create(&self, resource: NewResource) -> Result<Resource, RepositoryError> {
        let now = Utc::now();
        let info = encode_json(&resource.info)?;

        let row: ResourceRow = sqlx::query_as(&format!(
            "INSERT INTO resources
                (provider_name, type, info, deployment_uuid, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(&resource.provider_name)
        .bind(&resource.resource_type)
        .bind(&info)
        .bind(&resource.deployment_uuid)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::ForeignKey => {
                RepositoryError::not_found(EntityKind::Deployment, &resource.deployment_uuid)
            }
            _ => storage(e),
        })?;

        row.try_into()
    }

    async fn list(
        &self,
        deployment_uuid: &str,
        provider_name: Option<&str>,
        resource_type: Option<&str>,
    ) -> Result<Vec<Resource>, RepositoryError> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE deployment_uuid = "
        ));
        query.push_bind(deployment_uuid);

        if let Some(provider_name) = provider_name {
            query.push(" AND provider_name = ").push_bind(provider_name);
        }
        if let Some(resource_type) = resource_type {
            query.push(" AND type = ").push_bind(resource_type);
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<ResourceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        collect(rows)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(EntityKind::Resource, id));
        }
        Ok(())
    }
}
