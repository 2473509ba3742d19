//! `SQLite` implementation of the `VerificationRepository` trait.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};

use rally_core::{
    EntityKind, RepositoryError, Verification, VerificationRepository, VerificationResult,
    VerificationStatus, VerificationUpdate, generate_uuid,
};

use super::row_mappers::{
    VERIFICATION_COLUMNS, VERIFICATION_RESULT_COLUMNS, VerificationResultRow, VerificationRow,
    Violation, collect, encode_json, storage, violation,
};

async fn fetch_verification(
    conn: &mut SqliteConnection,
    uuid: &str,
) -> Result<Verification, RepositoryError> {
    let row: VerificationRow = sqlx::query_as(&format!(
        "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE uuid = ?"
    ))
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage)?
    .ok_or_else(|| RepositoryError::not_found(EntityKind::Verification, uuid))?;
    row.try_into()
}

/// `SQLite` implementation of the `VerificationRepository` trait.
pub struct SqliteVerificationRepository {
    pool: SqlitePool,
}

impl SqliteVerificationRepository {
    /// Create a new `SQLite` verification repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for SqliteVerificationRepository {
    async fn create(&self, deployment_uuid: &str) -> Result<Verification, RepositoryError> {
        let now = Utc::now();
        let row: VerificationRow = sqlx::query_as(&format!(
            "INSERT INTO verifications (uuid, deployment_uuid, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(generate_uuid())
        .bind(deployment_uuid)
        .bind(VerificationStatus::Init.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::ForeignKey => {
                RepositoryError::not_found(EntityKind::Deployment, deployment_uuid)
            }
            _ => storage(e),
        })?;

        row.try_into()
    }

    async fn get(&self, uuid: &str) -> Result<Verification, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        fetch_verification(&mut conn, uuid).await
    }

    async fn update(
        &self,
        uuid: &str,
        update: VerificationUpdate,
    ) -> Result<Verification, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let mut verification = fetch_verification(&mut tx, uuid).await?;
        update.apply(&mut verification);
        verification.updated_at = Utc::now();

        sqlx::query(
            "UPDATE verifications
             SET status = ?, set_name = ?, tests = ?, failures = ?, errors = ?, time = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(verification.status.as_str())
        .bind(&verification.set_name)
        .bind(verification.tests)
        .bind(verification.failures)
        .bind(verification.errors)
        .bind(verification.time)
        .bind(verification.updated_at)
        .bind(verification.id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(verification)
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, RepositoryError> {
        let rows: Vec<VerificationRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE status = ? ORDER BY id"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {VERIFICATION_COLUMNS} FROM verifications ORDER BY id"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage)?;

        collect(rows)
    }

    async fn delete(&self, uuid: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM verifications WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(EntityKind::Verification, uuid));
        }
        Ok(())
    }

    async fn create_result(
        &self,
        verification_uuid: &str,
        data: Value,
    ) -> Result<VerificationResult, RepositoryError> {
        let now = Utc::now();
        let row: VerificationResultRow = sqlx::query_as(&format!(
            "INSERT INTO verification_results (verification_uuid, data, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING {VERIFICATION_RESULT_COLUMNS}"
        ))
        .bind(verification_uuid)
        .bind(encode_json(&data)?)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::ForeignKey => {
                RepositoryError::not_found(EntityKind::Verification, verification_uuid)
            }
            _ => storage(e),
        })?;

        row.try_into()
    }

    async fn get_result(
        &self,
        verification_uuid: &str,
    ) -> Result<VerificationResult, RepositoryError> {
        let row: VerificationResultRow = sqlx::query_as(&format!(
            "SELECT {VERIFICATION_RESULT_COLUMNS} FROM verification_results
             WHERE verification_uuid = ? ORDER BY id LIMIT 1"
        ))
        .bind(verification_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| {
            RepositoryError::not_found(EntityKind::VerificationResult, verification_uuid)
        })?;

        row.try_into()
    }
}
