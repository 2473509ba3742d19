//! Process-wide database engine.
//!
//! The engine is a single `SqlitePool` built on first use from the active
//! [`DatabaseConfig`]. Construction happens under a mutex, so concurrent
//! first callers observe the same pool. [`reset_engine`] drops the cached
//! pool so the next [`engine`] call rebuilds it.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use rally_core::{ConfigError, DatabaseConfig};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while building or configuring the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("The database engine needs a running Tokio runtime")]
    NoRuntime,
}

struct EngineState {
    config: Option<DatabaseConfig>,
    pool: Option<SqlitePool>,
}

static ENGINE: Mutex<EngineState> = Mutex::new(EngineState {
    config: None,
    pool: None,
});

fn lock() -> MutexGuard<'static, EngineState> {
    // A panic while holding the lock cannot leave the state half-written.
    ENGINE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Connection options for `config`, with foreign keys enforced.
pub fn connect_options(config: &DatabaseConfig) -> Result<SqliteConnectOptions, EngineError> {
    let options = SqliteConnectOptions::from_str(&config.url).map_err(|e| {
        EngineError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        }
    })?;

    let options = options
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    // In-memory databases cannot use WAL.
    if config.url.contains(":memory:") || config.url.contains("mode=memory") {
        Ok(options)
    } else {
        Ok(options.journal_mode(SqliteJournalMode::Wal))
    }
}

/// Build a lazily connecting pool for `config`.
///
/// The pool spawns its maintenance tasks on the current Tokio runtime, so
/// calling this outside one fails with [`EngineError::NoRuntime`].
pub fn build_pool(config: &DatabaseConfig) -> Result<SqlitePool, EngineError> {
    let options = connect_options(config)?;
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(EngineError::NoRuntime);
    }
    Ok(SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(options))
}

/// Connect eagerly, failing fast when the database cannot be opened.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, EngineError> {
    let options = connect_options(config)?;
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// The shared pool, built on first use.
///
/// Without a prior [`configure_engine`] call, configuration is resolved
/// from the environment.
pub fn engine() -> Result<SqlitePool, EngineError> {
    let mut state = lock();
    if let Some(pool) = &state.pool {
        return Ok(pool.clone());
    }

    let config = match &state.config {
        Some(config) => config.clone(),
        None => {
            let config = DatabaseConfig::from_env()?;
            state.config = Some(config.clone());
            config
        }
    };

    let pool = build_pool(&config)?;
    info!(url = %config.url, "Database engine created");
    state.pool = Some(pool.clone());
    Ok(pool)
}

/// Drop the cached engine so the next [`engine`] call rebuilds it.
///
/// The old pool is closed before this returns, so handles cloned from it
/// (including repositories built by [`crate::RepoFactory::backend`]) fail
/// from then on.
pub async fn reset_engine() {
    let pool = lock().pool.take();
    if let Some(pool) = pool {
        debug!("Closing database engine");
        pool.close().await;
    }
}

/// Replace the engine configuration and drop the cached engine.
pub async fn configure_engine(config: DatabaseConfig) {
    let pool = {
        let mut state = lock();
        state.config = Some(config);
        state.pool.take()
    };
    if let Some(pool) = pool {
        pool.close().await;
    }
}
