//! Composition utilities for building [`Repos`] with `SQLite` backends.
//!
//! This module is focused purely on construction and should not contain
//! any domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use rally_core::Repos;

use crate::engine::{EngineError, engine};
use crate::repositories::{
    SqliteDeploymentRepository, SqliteResourceRepository, SqliteTaskRepository,
    SqliteVerificationRepository, SqliteWorkerRepository,
};

/// Factory for creating repository instances with `SQLite` backends.
pub struct RepoFactory;

impl RepoFactory {
    /// Build all `SQLite` repositories from a pool.
    pub fn build_repos(pool: SqlitePool) -> Repos {
        Repos::new(
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::new(SqliteDeploymentRepository::new(pool.clone())),
            Arc::new(SqliteResourceRepository::new(pool.clone())),
            Arc::new(SqliteVerificationRepository::new(pool.clone())),
            Arc::new(SqliteWorkerRepository::new(pool)),
        )
    }

    /// Repositories backed by the process-wide engine.
    ///
    /// Repeated calls share one pool until [`crate::reset_engine`] runs.
    /// Resetting closes that pool, so repositories returned earlier stop
    /// working and callers must ask for a fresh set.
    pub fn backend() -> Result<Repos, EngineError> {
        Ok(Self::build_repos(engine()?))
    }
}

/// Test database helper for integration tests.
///
/// Provides a private in-memory `SQLite` database with the head schema
/// already created, so tests run against the same tables as production.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Create a new in-memory test database with the head schema.
    pub async fn new() -> anyhow::Result<Self> {
        let (options, connect) = crate::memory_pool_options();
        let pool = options.connect_with(connect).await?;
        crate::Migrator::new(pool.clone())
            .create_from_models()
            .await?;
        Ok(Self { pool })
    }

    /// An in-memory database with no tables, for migration tests.
    pub async fn empty() -> anyhow::Result<Self> {
        let (options, connect) = crate::memory_pool_options();
        let pool = options.connect_with(connect).await?;
        Ok(Self { pool })
    }

    /// Get the pool for this test database.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All repositories over this database.
    pub fn repos(&self) -> Repos {
        RepoFactory::build_repos(self.pool.clone())
    }

    pub fn task_repository(&self) -> SqliteTaskRepository {
        SqliteTaskRepository::new(self.pool.clone())
    }

    pub fn deployment_repository(&self) -> SqliteDeploymentRepository {
        SqliteDeploymentRepository::new(self.pool.clone())
    }

    pub fn resource_repository(&self) -> SqliteResourceRepository {
        SqliteResourceRepository::new(self.pool.clone())
    }

    pub fn verification_repository(&self) -> SqliteVerificationRepository {
        SqliteVerificationRepository::new(self.pool.clone())
    }

    pub fn worker_repository(&self) -> SqliteWorkerRepository {
        SqliteWorkerRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_core::{DeploymentRepository, NewDeployment};

    #[tokio::test]
    async fn test_build_repos_share_one_database() {
        let db = TestDb::new().await.unwrap();
        let repos = db.repos();

        let created = repos
            .deployments
            .create(NewDeployment::new("dep-a"))
            .await
            .unwrap();
        let fetched = db.deployment_repository().get("dep-a").await.unwrap();

        assert_eq!(fetched.uuid, created.uuid);
        assert!(repos.tasks.list(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_database_has_no_tables() {
        let db = TestDb::empty().await.unwrap();
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 0);
    }
}
