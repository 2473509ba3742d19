//! Shared helpers for `rally-db` integration tests.

#![allow(dead_code)]

use rally_core::DatabaseConfig;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// A file-backed database in its own temporary directory.
pub struct FileDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn file_db() -> FileDb {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::for_path(&dir.path().join("rally.sqlite"));
    let pool = rally_db::connect(&config).await.unwrap();
    FileDb { pool, _dir: dir }
}

/// Insert a deployment row shaped like the baseline schema.
pub async fn insert_legacy_deployment(
    pool: &SqlitePool,
    uuid: &str,
    name: &str,
    admin: Option<&str>,
    users: &str,
) {
    sqlx::query(
        "INSERT INTO deployments (uuid, name, config, admin, users, status, created_at, updated_at)
         VALUES (?, ?, '{\"type\": \"ExistingCloud\"}', ?, ?, 'deploy->finished',
                 '2016-03-01T10:00:00+00:00', '2016-03-01T10:00:00+00:00')",
    )
    .bind(uuid)
    .bind(name)
    .bind(admin)
    .bind(users)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn insert_legacy_task(pool: &SqlitePool, uuid: &str, deployment_uuid: &str) {
    sqlx::query(
        "INSERT INTO tasks (uuid, status, verification_log, deployment_uuid, created_at, updated_at)
         VALUES (?, 'finished', '[]', ?, '2016-03-01T10:00:00+00:00', '2016-03-01T10:00:00+00:00')",
    )
    .bind(uuid)
    .bind(deployment_uuid)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_as::<_, (String,)>("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|(name,)| name)
        .collect()
}
