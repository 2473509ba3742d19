//! Table definitions shared by the revision chain and the head schema.
//!
//! Every table shape that ever existed is produced by one function here, so
//! a revision that rebuilds a table and [`create_head_schema`] cannot drift
//! apart. Table names are parameters because rebuilds create the new shape
//! under a temporary name before swapping it in.

use sqlx::SqliteConnection;

use super::MigrationError;

/// Single-row table holding the current revision stamp.
pub const VERSION_TABLE: &str = "schema_revision";

/// Every table in the head schema, children before parents.
pub const DROP_ORDER: &[&str] = &[
    "verification_results",
    "verifications",
    "task_results",
    "tasks",
    "resources",
    "deployments",
    "workers",
    VERSION_TABLE,
];

/// Columns of `deployments` across revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentsShape {
    /// Separate `admin` and `users` blobs, no `type`.
    Legacy,
    /// Legacy columns followed by `type`.
    Typed,
    /// `type` and a single `credentials` blob.
    Merged,
}

pub fn deployments(table: &str, shape: DeploymentsShape) -> String {
    let body = match shape {
        DeploymentsShape::Legacy => {
            "config TEXT NOT NULL DEFAULT '{}',
            admin TEXT,
            users TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'deploy->init',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL"
        }
        DeploymentsShape::Typed => {
            "config TEXT NOT NULL DEFAULT '{}',
            admin TEXT,
            users TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'deploy->init',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'openstack'"
        }
        DeploymentsShape::Merged => {
            "config TEXT NOT NULL DEFAULT '{}',
            credentials TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'deploy->init',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'openstack'"
        }
    };

    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            parent_uuid TEXT REFERENCES deployments(uuid),
            name TEXT NOT NULL UNIQUE,
            started_at TEXT,
            completed_at TEXT,
            {body}
        )"
    )
}

/// Column list shared by every `deployments` shape.
pub const DEPLOYMENT_COMMON_COLUMNS: &str =
    "id, uuid, parent_uuid, name, started_at, completed_at, config, status, created_at, updated_at";

fn on_delete(cascade: bool) -> &'static str {
    if cascade { " ON DELETE CASCADE" } else { "" }
}

pub fn resources(table: &str, cascade: bool) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider_name TEXT,
            type TEXT,
            info TEXT NOT NULL DEFAULT '{{}}',
            deployment_uuid TEXT NOT NULL REFERENCES deployments(uuid){},
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        on_delete(cascade)
    )
}

pub fn tasks(table: &str, cascade: bool) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'init',
            tag TEXT,
            verification_log TEXT NOT NULL DEFAULT '[]',
            deployment_uuid TEXT NOT NULL REFERENCES deployments(uuid){},
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        on_delete(cascade)
    )
}

pub fn task_results(table: &str, cascade: bool) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_uuid TEXT NOT NULL REFERENCES tasks(uuid){},
            key TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        on_delete(cascade)
    )
}

pub fn verifications(table: &str, cascade: bool) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL UNIQUE,
            deployment_uuid TEXT NOT NULL REFERENCES deployments(uuid){},
            status TEXT NOT NULL DEFAULT 'init',
            set_name TEXT,
            tests INTEGER NOT NULL DEFAULT 0,
            failures INTEGER NOT NULL DEFAULT 0,
            time REAL NOT NULL DEFAULT 0,
            errors INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        on_delete(cascade)
    )
}

pub fn verification_results(table: &str, cascade: bool) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            verification_uuid TEXT NOT NULL REFERENCES verifications(uuid){},
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        on_delete(cascade)
    )
}

pub fn workers(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hostname TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
    )
}

/// A child table whose foreign key behaviour changed across revisions.
#[derive(Debug, Clone, Copy)]
pub struct ChildTable {
    pub name: &'static str,
    pub columns: &'static str,
    pub ddl: fn(&str, bool) -> String,
}

/// Child tables in parent-first creation order.
pub const CHILD_TABLES: &[ChildTable] = &[
    ChildTable {
        name: "resources",
        columns: "id, provider_name, type, info, deployment_uuid, created_at, updated_at",
        ddl: resources,
    },
    ChildTable {
        name: "tasks",
        columns: "id, uuid, status, tag, verification_log, deployment_uuid, created_at, updated_at",
        ddl: tasks,
    },
    ChildTable {
        name: "task_results",
        columns: "id, task_uuid, key, data, created_at, updated_at",
        ddl: task_results,
    },
    ChildTable {
        name: "verifications",
        columns: "id, uuid, deployment_uuid, status, set_name, tests, failures, time, errors, created_at, updated_at",
        ddl: verifications,
    },
    ChildTable {
        name: "verification_results",
        columns: "id, verification_uuid, data, created_at, updated_at",
        ddl: verification_results,
    },
];

/// Temporary name used while a table is rebuilt.
pub fn rebuild_name(table: &str) -> String {
    format!("{table}__rebuild")
}

/// Replace `table` with the already-populated `{table}__rebuild`.
///
/// Foreign key enforcement must be off on `conn`.
pub async fn swap_rebuilt(conn: &mut SqliteConnection, table: &str) -> Result<(), MigrationError> {
    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&mut *conn)
        .await?;
    sqlx::query(&format!(
        "ALTER TABLE {} RENAME TO {table}",
        rebuild_name(table)
    ))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Rebuild a child table with or without cascading deletes, keeping its rows.
pub async fn rebuild_child(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    cascade: bool,
) -> Result<(), MigrationError> {
    let temp = rebuild_name(child.name);
    sqlx::query(&(child.ddl)(&temp, cascade))
        .execute(&mut *conn)
        .await?;
    sqlx::query(&format!(
        "INSERT INTO {temp} ({cols}) SELECT {cols} FROM {table}",
        cols = child.columns,
        table = child.name
    ))
    .execute(&mut *conn)
    .await?;
    swap_rebuilt(conn, child.name).await
}

/// Whether a table exists in the connected database.
pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, MigrationError> {
    let found: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

/// Create every table at the head revision.
pub async fn create_head_schema(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    sqlx::query(&deployments("deployments", DeploymentsShape::Merged))
        .execute(&mut *conn)
        .await?;
    for child in CHILD_TABLES {
        sqlx::query(&(child.ddl)(child.name, true))
            .execute(&mut *conn)
            .await?;
    }
    sqlx::query(&workers("workers")).execute(&mut *conn).await?;
    Ok(())
}
