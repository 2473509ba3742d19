//! `SQLite` persistence for rally.
//!
//! - [`engine`] - the process-wide connection pool and its lifecycle
//! - [`migrations`] - the linear revision chain and its runner
//! - [`repositories`] - `SQLite` implementations of the `rally-core` ports
//! - [`factory`] - wiring helpers that hand out a [`rally_core::Repos`]
//!
//! ```rust,no_run
//! use rally_db::{Migrator, RepoFactory, engine};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = engine()?;
//! Migrator::new(pool.clone()).upgrade(None).await?;
//! let repos = RepoFactory::build_repos(pool);
//! let workers = repos.workers;
//! # let _ = workers;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod engine;
pub mod factory;
pub mod migrations;
pub mod repositories;

// Keep the bundled SQLite build linked in.
use libsqlite3_sys as _;

pub use engine::{EngineError, configure_engine, connect, engine, reset_engine};
pub use factory::RepoFactory;
pub use migrations::{MigrationError, Migrator};

#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

pub use repositories::{
    SqliteDeploymentRepository, SqliteResourceRepository, SqliteTaskRepository,
    SqliteVerificationRepository, SqliteWorkerRepository,
};

#[cfg(any(test, feature = "test-utils"))]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Options for a private in-memory database with foreign keys enforced.
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn memory_pool_options() -> (SqlitePoolOptions, SqliteConnectOptions) {
    // Every connection to `:memory:` is a separate database, so the pool
    // must hold exactly one connection and never recycle it.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None);
    let connect = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);
    (pool, connect)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let (pool, connect) = memory_pool_options();
    pool.connect_with(connect).await.unwrap()
}
