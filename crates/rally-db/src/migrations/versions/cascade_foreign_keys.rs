//! 5b983f0c9b9a: cascade deletes from parents to child rows.
//!
//! `SQLite` cannot alter a foreign key in place, so every child table is
//! rebuilt with the new constraint and its rows copied across.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrations::schema::{CHILD_TABLES, rebuild_child};
use crate::migrations::{MigrationError, Revision};

pub struct CascadeForeignKeys;

#[async_trait]
impl Revision for CascadeForeignKeys {
    fn id(&self) -> &'static str {
        "5b983f0c9b9a"
    }

    fn down_revision(&self) -> Option<&'static str> {
        Some("3177d36ea270")
    }

    fn message(&self) -> &'static str {
        "Make cascade delete for foreign key items"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        for child in CHILD_TABLES {
            rebuild_child(conn, child, true).await?;
        }
        Ok(())
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        for child in CHILD_TABLES {
            rebuild_child(conn, child, false).await?;
        }
        Ok(())
    }
}
