//! The migration runner.

use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::revision::{Revision, RevisionChain, Target};
use super::schema::{self, DROP_ORDER, VERSION_TABLE};
use super::{MigrationError, versions};

/// Direction of a single revision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

/// Applies, reverts and stamps revisions on one database.
#[derive(Debug)]
pub struct Migrator {
    pool: SqlitePool,
    chain: RevisionChain,
}

impl Migrator {
    /// A migrator over the built-in revision chain.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            chain: RevisionChain::from_validated(versions::all()),
        }
    }

    /// A migrator over a custom chain.
    pub const fn with_chain(pool: SqlitePool, chain: RevisionChain) -> Self {
        Self { pool, chain }
    }

    pub const fn chain(&self) -> &RevisionChain {
        &self.chain
    }

    /// The revision stamped on the database, `None` if unversioned.
    pub async fn current_revision(&self) -> Result<Option<String>, MigrationError> {
        let mut conn = self.pool.acquire().await?;
        read_stamp(&mut conn).await
    }

    /// Upgrade to `target` (default `head`).
    ///
    /// An unversioned database that already holds the legacy tables is
    /// stamped with the baseline first. An empty one gets the baseline
    /// applied like any other revision.
    pub async fn upgrade(&self, target: Option<&str>) -> Result<(), MigrationError> {
        let target_name = target.unwrap_or("head");
        let Target::At(target) = self.chain.resolve(target_name)? else {
            return Err(MigrationError::InvalidTarget {
                operation: "upgrade",
                current: describe(self.current_revision().await?.as_deref()),
                target: target_name.to_string(),
            });
        };

        let current = match self.current_position().await? {
            Target::Base if self.has_legacy_schema().await? => {
                info!(
                    revision = self.chain.base(),
                    "Unversioned database with existing schema; stamping baseline"
                );
                self.write_stamp(Some(self.chain.base())).await?;
                Target::At(0)
            }
            position => position,
        };

        if Target::At(target) < current {
            return Err(MigrationError::InvalidTarget {
                operation: "upgrade",
                current: describe(self.chain.id_at(current)),
                target: target_name.to_string(),
            });
        }

        let start = match current {
            Target::Base => 0,
            Target::At(index) => index + 1,
        };
        if start > target {
            debug!(revision = self.chain.head(), "Database already at target revision");
            return Ok(());
        }

        for index in start..=target {
            if let Some(revision) = self.chain.get(index) {
                self.apply(revision, Step::Up).await?;
            }
        }
        Ok(())
    }

    /// Downgrade to `target` (a revision id or `base`).
    pub async fn downgrade(&self, target: &str) -> Result<(), MigrationError> {
        let resolved = self.chain.resolve(target)?;
        let current = self.current_position().await?;

        if resolved > current {
            return Err(MigrationError::InvalidTarget {
                operation: "downgrade",
                current: describe(self.chain.id_at(current)),
                target: target.to_string(),
            });
        }

        let Target::At(mut index) = current else {
            return Ok(());
        };
        loop {
            if Target::At(index) == resolved {
                break;
            }
            if let Some(revision) = self.chain.get(index) {
                self.apply(revision, Step::Down).await?;
            }
            if index == 0 {
                break;
            }
            index -= 1;
        }
        Ok(())
    }

    /// Record `revision` (an id, `head` or `base`) without running anything.
    pub async fn stamp(&self, revision: &str) -> Result<(), MigrationError> {
        let resolved = self.chain.resolve(revision)?;
        let id = self.chain.id_at(resolved);
        self.write_stamp(id).await?;
        info!(revision = id.unwrap_or("base"), "Database stamped");
        Ok(())
    }

    /// Create the head schema directly on a fresh database and stamp it.
    pub async fn create_from_models(&self) -> Result<(), MigrationError> {
        if let Some(current) = self.current_revision().await? {
            return Err(MigrationError::AlreadyVersioned(current));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;
        schema::create_head_schema(&mut tx).await?;
        write_stamp(&mut tx, Some(self.chain.head())).await?;
        tx.commit().await?;

        info!(revision = self.chain.head(), "Schema created from models");
        Ok(())
    }

    /// Drop every table, including the revision table.
    pub async fn drop_schema(&self) -> Result<(), MigrationError> {
        warn!("Dropping the whole database schema");
        let mut conn = self.pool.acquire().await?;
        set_foreign_keys(&mut conn, false).await?;
        let result = drop_tables(&mut conn).await;
        set_foreign_keys(&mut conn, true).await?;
        result
    }

    // ─── internals ──────────────────────────────────────────────────────────

    async fn current_position(&self) -> Result<Target, MigrationError> {
        match self.current_revision().await? {
            None => Ok(Target::Base),
            Some(id) => self
                .chain
                .position(&id)
                .map(Target::At)
                .ok_or(MigrationError::UnknownRevision(id)),
        }
    }

    async fn has_legacy_schema(&self) -> Result<bool, MigrationError> {
        let mut conn = self.pool.acquire().await?;
        schema::table_exists(&mut conn, "deployments").await
    }

    async fn write_stamp(&self, revision: Option<&str>) -> Result<(), MigrationError> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;
        write_stamp(&mut tx, revision).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Run one revision step and move the stamp in the same transaction.
    async fn apply(&self, revision: &dyn Revision, step: Step) -> Result<(), MigrationError> {
        let (new_stamp, verb) = match step {
            Step::Up => (Some(revision.id()), "Upgrading"),
            Step::Down => (revision.down_revision(), "Downgrading"),
        };
        info!(
            revision = revision.id(),
            message = revision.message(),
            "{verb} database schema"
        );

        // The pragma is a no-op inside a transaction, so it is toggled around
        // the step and restored even when the step fails.
        let mut conn = self.pool.acquire().await?;
        set_foreign_keys(&mut conn, false).await?;
        let result = run_step(&mut conn, revision, step, new_stamp).await;
        set_foreign_keys(&mut conn, true).await?;
        result
    }
}

fn describe(revision: Option<&str>) -> String {
    revision.unwrap_or("base").to_string()
}

async fn run_step(
    conn: &mut SqliteConnection,
    revision: &dyn Revision,
    step: Step,
    new_stamp: Option<&str>,
) -> Result<(), MigrationError> {
    let mut tx = conn.begin().await?;
    match step {
        Step::Up => revision.upgrade(&mut tx).await?,
        Step::Down => revision.downgrade(&mut tx).await?,
    }
    write_stamp(&mut tx, new_stamp).await?;
    check_foreign_keys(&mut tx).await?;
    tx.commit().await?;
    Ok(())
}

async fn set_foreign_keys(conn: &mut SqliteConnection, on: bool) -> Result<(), MigrationError> {
    let pragma = if on {
        "PRAGMA foreign_keys = ON"
    } else {
        "PRAGMA foreign_keys = OFF"
    };
    sqlx::query(pragma).execute(&mut *conn).await?;
    Ok(())
}

async fn drop_tables(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    for table in DROP_ORDER {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn check_foreign_keys(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    let violations: Vec<(String, Option<i64>, String, i64)> =
        sqlx::query_as("PRAGMA foreign_key_check")
            .fetch_all(&mut *conn)
            .await?;
    match violations.first() {
        None => Ok(()),
        Some((table, rowid, parent, _)) => Err(MigrationError::InvalidData {
            table: table.clone(),
            reason: format!(
                "{} row(s) violate foreign keys, first rowid {rowid:?} referencing {parent}",
                violations.len()
            ),
        }),
    }
}

async fn read_stamp(conn: &mut SqliteConnection) -> Result<Option<String>, MigrationError> {
    if !schema::table_exists(conn, VERSION_TABLE).await? {
        return Ok(None);
    }
    let row: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT revision FROM {VERSION_TABLE} LIMIT 1"
    ))
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|(revision,)| revision))
}

async fn write_stamp(
    conn: &mut SqliteConnection,
    revision: Option<&str>,
) -> Result<(), MigrationError> {
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (revision TEXT NOT NULL PRIMARY KEY)"
    ))
    .execute(&mut *conn)
    .await?;
    sqlx::query(&format!("DELETE FROM {VERSION_TABLE}"))
        .execute(&mut *conn)
        .await?;
    if let Some(revision) = revision {
        sqlx::query(&format!("INSERT INTO {VERSION_TABLE} (revision) VALUES (?)"))
            .bind(revision)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::INITIAL_REVISION;
    use crate::test_pool;

    async fn columns(pool: &SqlitePool, table: &str) -> Vec<(String, String, bool, bool)> {
        sqlx::query_as(r#"SELECT name, type, "notnull", pk > 0 FROM pragma_table_info(?)"#)
            .bind(table)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    async fn foreign_keys(pool: &SqlitePool, table: &str) -> Vec<(String, String, String, String)> {
        sqlx::query_as(
            r#"SELECT "table", "from", "to", on_delete FROM pragma_foreign_key_list(?)"#,
        )
        .bind(table)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[test]
    fn test_builtin_chain_is_linear() {
        let chain = RevisionChain::new(versions::all()).unwrap();
        assert_eq!(chain.base(), INITIAL_REVISION);
        assert_eq!(chain.head(), "5b983f0c9b9a");
        assert_eq!(chain.len(), 5);
    }

    #[tokio::test]
    async fn test_fresh_database_is_unversioned() {
        let migrator = Migrator::new(test_pool().await);
        assert_eq!(migrator.current_revision().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upgrade_empty_database_to_head() {
        let pool = test_pool().await;
        let migrator = Migrator::new(pool.clone());

        migrator.upgrade(None).await.unwrap();

        assert_eq!(
            migrator.current_revision().await.unwrap().as_deref(),
            Some("5b983f0c9b9a")
        );
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM workers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_upgrade_is_idempotent_at_head() {
        let migrator = Migrator::new(test_pool().await);
        migrator.upgrade(None).await.unwrap();
        migrator.upgrade(Some("head")).await.unwrap();
        assert_eq!(
            migrator.current_revision().await.unwrap().as_deref(),
            Some(migrator.chain().head())
        );
    }

    #[tokio::test]
    async fn test_create_from_models_matches_replayed_chain() {
        let replayed = test_pool().await;
        Migrator::new(replayed.clone()).upgrade(None).await.unwrap();

        let created = test_pool().await;
        Migrator::new(created.clone())
            .create_from_models()
            .await
            .unwrap();

        for table in [
            "deployments",
            "resources",
            "tasks",
            "task_results",
            "verifications",
            "verification_results",
            "workers",
        ] {
            assert_eq!(
                columns(&replayed, table).await,
                columns(&created, table).await,
                "columns of {table}"
            );
            assert_eq!(
                foreign_keys(&replayed, table).await,
                foreign_keys(&created, table).await,
                "foreign keys of {table}"
            );
        }

        let fks = foreign_keys(&created, "task_results").await;
        assert_eq!(fks[0].0, "tasks");
        assert_eq!(fks[0].3, "CASCADE");
    }

    #[tokio::test]
    async fn test_create_from_models_refuses_versioned_database() {
        let migrator = Migrator::new(test_pool().await);
        migrator.stamp(INITIAL_REVISION).await.unwrap();

        let err = migrator.create_from_models().await.unwrap_err();
        assert!(matches!(err, MigrationError::AlreadyVersioned(rev) if rev == INITIAL_REVISION));
    }

    #[tokio::test]
    async fn test_stamp_does_not_touch_schema() {
        let pool = test_pool().await;
        let migrator = Migrator::new(pool.clone());

        migrator.stamp("head").await.unwrap();
        assert_eq!(
            migrator.current_revision().await.unwrap().as_deref(),
            Some("5b983f0c9b9a")
        );
        let mut conn = pool.acquire().await.unwrap();
        assert!(!schema::table_exists(&mut conn, "deployments").await.unwrap());
        drop(conn);

        migrator.stamp("base").await.unwrap();
        assert_eq!(migrator.current_revision().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stamp_unknown_revision_rejected() {
        let migrator = Migrator::new(test_pool().await);
        assert!(matches!(
            migrator.stamp("deadbeef").await,
            Err(MigrationError::UnknownRevision(_))
        ));
    }

    #[tokio::test]
    async fn test_downgrade_to_base_removes_everything() {
        let pool = test_pool().await;
        let migrator = Migrator::new(pool.clone());
        migrator.upgrade(None).await.unwrap();

        migrator.downgrade("base").await.unwrap();

        assert_eq!(migrator.current_revision().await.unwrap(), None);
        let mut conn = pool.acquire().await.unwrap();
        for table in ["deployments", "tasks", "workers"] {
            assert!(!schema::table_exists(&mut conn, table).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_wrong_direction_targets_rejected() {
        let migrator = Migrator::new(test_pool().await);
        migrator.upgrade(Some("9a17990786a2")).await.unwrap();

        assert!(matches!(
            migrator.upgrade(Some(INITIAL_REVISION)).await,
            Err(MigrationError::InvalidTarget { operation: "upgrade", .. })
        ));
        assert!(matches!(
            migrator.downgrade("head").await,
            Err(MigrationError::InvalidTarget { operation: "downgrade", .. })
        ));
        assert!(matches!(
            migrator.upgrade(Some("base")).await,
            Err(MigrationError::InvalidTarget { .. })
        ));
    }

    #[tokio::test]
    async fn test_drop_schema_removes_revision_table() {
        let pool = test_pool().await;
        let migrator = Migrator::new(pool.clone());
        migrator.create_from_models().await.unwrap();

        migrator.drop_schema().await.unwrap();

        assert_eq!(migrator.current_revision().await.unwrap(), None);
        let mut conn = pool.acquire().await.unwrap();
        assert!(!schema::table_exists(&mut conn, "deployments").await.unwrap());
        assert!(!schema::table_exists(&mut conn, VERSION_TABLE).await.unwrap());
    }
}
