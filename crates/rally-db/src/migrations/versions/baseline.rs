//! ca3626f62937: schema as it existed before revision tracking.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrations::schema::{self, CHILD_TABLES, DeploymentsShape};
use crate::migrations::{MigrationError, Revision};

pub struct Baseline;

#[async_trait]
impl Revision for Baseline {
    fn id(&self) -> &'static str {
        super::INITIAL_REVISION
    }

    fn down_revision(&self) -> Option<&'static str> {
        None
    }

    fn message(&self) -> &'static str {
        "Initial schema"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(&schema::deployments("deployments", DeploymentsShape::Legacy))
            .execute(&mut *conn)
            .await?;
        for child in CHILD_TABLES {
            sqlx::query(&(child.ddl)(child.name, false))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        for child in CHILD_TABLES.iter().rev() {
            sqlx::query(&format!("DROP TABLE {}", child.name))
                .execute(&mut *conn)
                .await?;
        }
        sqlx::query("DROP TABLE deployments")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
