//! 3177d36ea270: add the workers table.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrations::schema;
use crate::migrations::{MigrationError, Revision};

pub struct AddWorkers;

#[async_trait]
impl Revision for AddWorkers {
    fn id(&self) -> &'static str {
        "3177d36ea270"
    }

    fn down_revision(&self) -> Option<&'static str> {
        Some("9a17990786a2")
    }

    fn message(&self) -> &'static str {
        "Add workers table"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(&schema::workers("workers"))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE workers").execute(&mut *conn).await?;
        Ok(())
    }
}
