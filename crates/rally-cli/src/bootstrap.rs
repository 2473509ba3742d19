//! CLI bootstrap - the composition root for `rally-manage`.
//!
//! Resolves the database configuration, installs it as the process-wide
//! engine and hands back a [`Migrator`] over it.

use std::env;

use rally_core::DatabaseConfig;
use rally_core::config::DATABASE_URL_ENV;
use rally_db::{Migrator, configure_engine, engine};

use crate::error::CliError;

/// Resolve configuration, letting an explicit URL override the environment.
pub fn resolve_config(database_url: Option<&str>) -> Result<DatabaseConfig, CliError> {
    let config = DatabaseConfig::from_lookup(|name| match database_url {
        Some(url) if name == DATABASE_URL_ENV => Some(url.to_string()),
        _ => env::var(name).ok(),
    })?;
    Ok(config)
}

/// Configure the engine and build a migrator over it.
pub async fn bootstrap(database_url: Option<&str>) -> Result<Migrator, CliError> {
    let config = resolve_config(database_url)?;
    configure_engine(config).await;
    Ok(Migrator::new(engine()?))
}
