//! `SQLite` implementation of the `DeploymentRepository` trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use rally_core::{
    Deployment, DeploymentRepository, DeploymentStatus, DeploymentUpdate, EntityKind,
    NewDeployment, RepositoryError,
};

use super::row_mappers::{
    DEPLOYMENT_COLUMNS, DeploymentRow, Violation, collect, encode_json, storage, violation,
};

/// Look up a deployment by name first, then by UUID.
pub(super) async fn find_deployment(
    conn: &mut SqliteConnection,
    deployment: &str,
) -> Result<Deployment, RepositoryError> {
    let by_name: Option<DeploymentRow> = sqlx::query_as(&format!(
        "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE name = ?"
    ))
    .bind(deployment)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage)?;

    let row = match by_name {
        Some(row) => row,
        None => sqlx::query_as(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE uuid = ?"
        ))
        .bind(deployment)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage)?
        .ok_or_else(|| RepositoryError::not_found(EntityKind::Deployment, deployment))?,
    };

    row.try_into()
}

/// Translate a failed insert or update into a domain error.
fn write_error(e: sqlx::Error, uuid: &str, name: &str, parent: Option<&str>) -> RepositoryError {
    match violation(&e) {
        Violation::Unique if e.to_string().contains("deployments.uuid") => {
            RepositoryError::already_exists(EntityKind::Deployment, uuid)
        }
        Violation::Unique => RepositoryError::already_exists(EntityKind::Deployment, name),
        Violation::ForeignKey => {
            RepositoryError::not_found(EntityKind::Deployment, parent.unwrap_or_default())
        }
        Violation::Other => storage(e),
    }
}

/// `SQLite` implementation of the `DeploymentRepository` trait.
pub struct SqliteDeploymentRepository {
    pool: SqlitePool,
}

impl SqliteDeploymentRepository {
    /// Create a new `SQLite` deployment repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentRepository for SqliteDeploymentRepository {
    async fn create(&self, deployment: NewDeployment) -> Result<Deployment, RepositoryError> {
        let now = Utc::now();
        let config = encode_json(&deployment.config)?;
        let credentials = encode_json(&deployment.credentials)?;

        let row: DeploymentRow = sqlx::query_as(&format!(
            "INSERT INTO deployments
                (uuid, parent_uuid, name, type, status, config, credentials, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {DEPLOYMENT_COLUMNS}"
        ))
        .bind(&deployment.uuid)
        .bind(&deployment.parent_uuid)
        .bind(&deployment.name)
        .bind(&deployment.deployment_type)
        .bind(deployment.status.as_str())
        .bind(&config)
        .bind(&credentials)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                &deployment.uuid,
                &deployment.name,
                deployment.parent_uuid.as_deref(),
            )
        })?;

        debug!(uuid = %deployment.uuid, name = %deployment.name, "Deployment created");
        row.try_into()
    }

    async fn get(&self, deployment: &str) -> Result<Deployment, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        find_deployment(&mut conn, deployment).await
    }

    async fn update(
        &self,
        deployment: &str,
        update: DeploymentUpdate,
    ) -> Result<Deployment, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let mut current = find_deployment(&mut tx, deployment).await?;
        update.apply(&mut current);
        current.updated_at = Utc::now();

        let config = encode_json(&current.config)?;
        let credentials = encode_json(&current.credentials)?;

        sqlx::query(
            "UPDATE deployments
             SET name = ?, parent_uuid = ?, type = ?, status = ?, config = ?, credentials = ?,
                 started_at = ?, completed_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&current.name)
        .bind(&current.parent_uuid)
        .bind(&current.deployment_type)
        .bind(current.status.as_str())
        .bind(&config)
        .bind(&credentials)
        .bind(current.started_at)
        .bind(current.completed_at)
        .bind(current.updated_at)
        .bind(current.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(
                e,
                &current.uuid,
                &current.name,
                current.parent_uuid.as_deref(),
            )
        })?;

        tx.commit().await.map_err(storage)?;
        Ok(current)
    }

    async fn delete(&self, uuid: &str) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let (resources,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM resources WHERE deployment_uuid = ?")
                .bind(uuid)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage)?;
        if resources > 0 {
            return Err(RepositoryError::busy(EntityKind::Deployment, uuid));
        }

        let result = sqlx::query("DELETE FROM deployments WHERE uuid = ?")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(|e| match violation(&e) {
                // Sub-deployments still point at this one.
                Violation::ForeignKey => RepositoryError::busy(EntityKind::Deployment, uuid),
                _ => storage(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(EntityKind::Deployment, uuid));
        }

        tx.commit().await.map_err(storage)?;
        debug!(uuid, "Deployment deleted");
        Ok(())
    }

    async fn list(
        &self,
        status: Option<DeploymentStatus>,
        parent_uuid: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Deployment>, RepositoryError> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE "
        ));

        match parent_uuid {
            Some(parent) => {
                query.push("parent_uuid = ").push_bind(parent);
            }
            None => {
                query.push("parent_uuid IS NULL");
            }
        }
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            query.push(" AND name = ").push_bind(name);
        }
        query.push(" ORDER BY id");

        let rows: Vec<DeploymentRow> = query
            .build_query_as::<DeploymentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        collect(rows)
    }
}
