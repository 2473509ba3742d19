//! Versioned schema migrations.
//!
//! The schema evolves through a strictly linear chain of revisions, each
//! identified by an opaque id and pointing at its predecessor. The current
//! revision is stamped in a one-row table; [`Migrator`] moves the database
//! along the chain, stamps it, or materializes the head schema directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use rally_db::migrations::Migrator;
//!
//! # async fn example(pool: sqlx::SqlitePool) -> Result<(), rally_db::migrations::MigrationError> {
//! let migrator = Migrator::new(pool);
//! migrator.upgrade(None).await?;
//! assert_eq!(migrator.current_revision().await?.as_deref(), Some(migrator.chain().head()));
//! # Ok(())
//! # }
//! ```

mod error;
mod revision;
mod runner;
pub mod schema;
mod versions;

pub use error::MigrationError;
pub use revision::{Revision, RevisionChain, Target};
pub use runner::Migrator;
pub use versions::{INITIAL_REVISION, all as revisions};
