//! 9a17990786a2: merge the `admin` and `users` blobs into `credentials`.

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::SqliteConnection;

use crate::migrations::schema::{
    self, DEPLOYMENT_COMMON_COLUMNS, DeploymentsShape, rebuild_name, swap_rebuilt,
};
use crate::migrations::{MigrationError, Revision};

pub struct MergeCredentials;

fn parse_blob(id: i64, column: &str, raw: &str) -> Result<Value, MigrationError> {
    serde_json::from_str(raw).map_err(|e| MigrationError::InvalidData {
        table: "deployments".to_string(),
        reason: format!("row {id}: {column} is not valid JSON: {e}"),
    })
}

#[async_trait]
impl Revision for MergeCredentials {
    fn id(&self) -> &'static str {
        "9a17990786a2"
    }

    fn down_revision(&self) -> Option<&'static str> {
        Some("1891b59eca2f")
    }

    fn message(&self) -> &'static str {
        "Merge credentials from users and admin"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        let temp = rebuild_name("deployments");
        sqlx::query(&schema::deployments(&temp, DeploymentsShape::Merged))
            .execute(&mut *conn)
            .await?;
        sqlx::query(&format!(
            "INSERT INTO {temp} ({DEPLOYMENT_COMMON_COLUMNS}, type, credentials)
             SELECT {DEPLOYMENT_COMMON_COLUMNS}, type, '{{}}' FROM deployments"
        ))
        .execute(&mut *conn)
        .await?;

        let rows: Vec<(i64, Option<String>, String)> =
            sqlx::query_as("SELECT id, admin, users FROM deployments")
                .fetch_all(&mut *conn)
                .await?;

        for (id, admin, users) in rows {
            let admin = match admin {
                Some(raw) => parse_blob(id, "admin", &raw)?,
                None => Value::Null,
            };
            let users = parse_blob(id, "users", &users)?;
            let credentials = json!({ "admin": admin, "users": users });

            sqlx::query(&format!("UPDATE {temp} SET credentials = ? WHERE id = ?"))
                .bind(credentials.to_string())
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }

        swap_rebuilt(conn, "deployments").await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        let temp = rebuild_name("deployments");
        sqlx::query(&schema::deployments(&temp, DeploymentsShape::Typed))
            .execute(&mut *conn)
            .await?;
        sqlx::query(&format!(
            "INSERT INTO {temp} ({DEPLOYMENT_COMMON_COLUMNS}, type, admin, users)
             SELECT {DEPLOYMENT_COMMON_COLUMNS}, type, NULL, '[]' FROM deployments"
        ))
        .execute(&mut *conn)
        .await?;

        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, credentials FROM deployments")
            .fetch_all(&mut *conn)
            .await?;

        for (id, credentials) in rows {
            let mut credentials = parse_blob(id, "credentials", &credentials)?;
            let admin = match credentials.get_mut("admin").map(Value::take) {
                None | Some(Value::Null) => None,
                Some(admin) => Some(admin.to_string()),
            };
            let users = match credentials.get_mut("users").map(Value::take) {
                None | Some(Value::Null) => "[]".to_string(),
                Some(users) => users.to_string(),
            };

            sqlx::query(&format!(
                "UPDATE {temp} SET admin = ?, users = ? WHERE id = ?"
            ))
            .bind(admin)
            .bind(users)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }

        swap_rebuilt(conn, "deployments").await
    }
}
