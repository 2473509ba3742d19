//! 1891b59eca2f: add the deployment type column.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrations::{MigrationError, Revision};

pub struct AddDeploymentType;

#[async_trait]
impl Revision for AddDeploymentType {
    fn id(&self) -> &'static str {
        "1891b59eca2f"
    }

    fn down_revision(&self) -> Option<&'static str> {
        Some(super::INITIAL_REVISION)
    }

    fn message(&self) -> &'static str {
        "Add deployment type column"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // Existing rows are back-filled through the column default.
        sqlx::query("ALTER TABLE deployments ADD COLUMN type TEXT NOT NULL DEFAULT 'openstack'")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("ALTER TABLE deployments DROP COLUMN type")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
