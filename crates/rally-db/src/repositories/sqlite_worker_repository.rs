//! `SQLite` implementation of the `WorkerRepository` trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use rally_core::{EntityKind, NewWorker, RepositoryError, Worker, WorkerRepository};

use super::row_mappers::{Violation, WORKER_COLUMNS, WorkerRow, storage, violation};

/// `SQLite` implementation of the `WorkerRepository` trait.
pub struct SqliteWorkerRepository {
    pool: SqlitePool,
}

impl SqliteWorkerRepository {
    /// Create a new `SQLite` worker repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkerRepository for SqliteWorkerRepository {
    async fn register(&self, worker: NewWorker) -> Result<Worker, RepositoryError> {
        let now = Utc::now();
        let row: WorkerRow = sqlx::query_as(&format!(
            "INSERT INTO workers (hostname, created_at, updated_at) VALUES (?, ?, ?)
             RETURNING {WORKER_COLUMNS}"
        ))
        .bind(&worker.hostname)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique => RepositoryError::already_exists(EntityKind::Worker, &worker.hostname),
            _ => storage(e),
        })?;

        debug!(hostname = %worker.hostname, "Worker registered");
        Ok(row.into())
    }

    async fn get(&self, hostname: &str) -> Result<Worker, RepositoryError> {
        let row: WorkerRow = sqlx::query_as(&format!(
            "SELECT {WORKER_COLUMNS} FROM workers WHERE hostname = ?"
        ))
        .bind(hostname)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| RepositoryError::not_found(EntityKind::Worker, hostname))?;

        Ok(row.into())
    }

    async fn unregister(&self, hostname: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM workers WHERE hostname = ?")
            .bind(hostname)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(EntityKind::Worker, hostname));
        }
        debug!(hostname, "Worker unregistered");
        Ok(())
    }

    async fn update(&self, hostname: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE workers SET updated_at = ? WHERE hostname = ?")
            .bind(Utc::now())
            .bind(hostname)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(EntityKind::Worker, hostname));
        }
        Ok(())
    }
}
