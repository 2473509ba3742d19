//! `SQLite` implementation of the `TaskRepository` trait.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use rally_core::{
    EntityKind, NewTask, RepositoryError, Task, TaskDetailed, TaskRepository, TaskResult,
    TaskStatus, TaskUpdate,
};

use super::row_mappers::{
    TASK_COLUMNS, TASK_RESULT_COLUMNS, TaskResultRow, TaskRow, Violation, collect, encode_json,
    parse_task_status, storage, violation,
};
use super::sqlite_deployment_repository::find_deployment;

async fn fetch_task(conn: &mut SqliteConnection, uuid: &str) -> Result<Task, RepositoryError> {
    let row: TaskRow = sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE uuid = ?"))
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage)?
        .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, uuid))?;
    row.try_into()
}

async fn fetch_results(
    conn: &mut SqliteConnection,
    task_uuid: &str,
) -> Result<Vec<TaskResult>, RepositoryError> {
    let rows: Vec<TaskResultRow> = sqlx::query_as(&format!(
        "SELECT {TASK_RESULT_COLUMNS} FROM task_results WHERE task_uuid = ? ORDER BY id"
    ))
    .bind(task_uuid)
    .fetch_all(&mut *conn)
    .await
    .map_err(storage)?;
    collect(rows)
}

async fn current_status(
    conn: &mut SqliteConnection,
    uuid: &str,
) -> Result<Option<String>, RepositoryError> {
    let status: Option<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE uuid = ?")
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage)?;
    Ok(status.map(|(s,)| s))
}

/// Explain why a guarded write touched no row.
async fn guard_failure(
    conn: &mut SqliteConnection,
    uuid: &str,
    required: String,
) -> RepositoryError {
    match current_status(conn, uuid).await {
        Ok(Some(actual)) => RepositoryError::InvalidStatus {
            kind: EntityKind::Task,
            id: uuid.to_string(),
            required,
            actual,
        },
        Ok(None) => RepositoryError::not_found(EntityKind::Task, uuid),
        Err(e) => e,
    }
}

/// `SQLite` implementation of the `TaskRepository` trait.
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    /// Create a new `SQLite` task repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let now = Utc::now();
        let verification_log = encode_json(&task.verification_log)?;

        let row: TaskRow = sqlx::query_as(&format!(
            "INSERT INTO tasks
                (uuid, status, tag, verification_log, deployment_uuid, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.uuid)
        .bind(task.status.as_str())
        .bind(&task.tag)
        .bind(&verification_log)
        .bind(&task.deployment_uuid)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique => RepositoryError::already_exists(EntityKind::Task, &task.uuid),
            Violation::ForeignKey => {
                RepositoryError::not_found(EntityKind::Deployment, &task.deployment_uuid)
            }
            Violation::Other => storage(e),
        })?;

        debug!(uuid = %task.uuid, deployment = %task.deployment_uuid, "Task created");
        row.try_into()
    }

    async fn get(&self, uuid: &str) -> Result<Task, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        fetch_task(&mut conn, uuid).await
    }

    async fn get_detailed(&self, uuid: &str) -> Result<TaskDetailed, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        let task = fetch_task(&mut conn, uuid).await?;
        let results = fetch_results(&mut conn, uuid).await?;
        Ok(TaskDetailed { task, results })
    }

    async fn get_status(&self, uuid: &str) -> Result<TaskStatus, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        let status = current_status(&mut conn, uuid)
            .await?
            .ok_or_else(|| RepositoryError::not_found(EntityKind::Task, uuid))?;
        parse_task_status(&status)
    }

    async fn get_detailed_last(&self) -> Result<Option<TaskDetailed>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC LIMIT 1"
        ))
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let task: Task = row.try_into()?;
        let results = fetch_results(&mut conn, &task.uuid).await?;
        Ok(Some(TaskDetailed { task, results }))
    }

    async fn update(&self, uuid: &str, update: TaskUpdate) -> Result<Task, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let mut task = fetch_task(&mut tx, uuid).await?;
        update.apply(&mut task);
        task.updated_at = Utc::now();

        let verification_log = encode_json(&task.verification_log)?;
        sqlx::query(
            "UPDATE tasks SET status = ?, tag = ?, verification_log = ?, updated_at = ? WHERE id = ?",
        )
        .bind(task.status.as_str())
        .bind(&task.tag)
        .bind(&verification_log)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(task)
    }

    async fn update_status(
        &self,
        uuid: &str,
        allowed: &[TaskStatus],
        status: TaskStatus,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE tasks SET status = ");
        query
            .push_bind(status.as_str())
            .push(", updated_at = ")
            .push_bind(Utc::now())
            .push(" WHERE uuid = ")
            .push_bind(uuid);
        if allowed.is_empty() {
            query.push(" AND 0");
        } else {
            query.push(" AND status IN (");
            let mut statuses = query.separated(", ");
            for allowed_status in allowed {
                statuses.push_bind(allowed_status.as_str());
            }
            statuses.push_unseparated(")");
        }

        let result = query.build().execute(&mut *tx).await.map_err(storage)?;
        if result.rows_affected() == 0 {
            let required = allowed
                .iter()
                .map(TaskStatus::as_str)
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(guard_failure(&mut tx, uuid, required).await);
        }

        tx.commit().await.map_err(storage)?;
        debug!(uuid, status = %status, "Task status updated");
        Ok(())
    }

    async fn list(
        &self,
        status: Option<TaskStatus>,
        deployment: Option<&str>,
    ) -> Result<Vec<Task>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;

        let deployment_uuid = match deployment {
            Some(deployment) => Some(find_deployment(&mut conn, deployment).await?.uuid),
            None => None,
        };

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1 = 1"));
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(deployment_uuid) = deployment_uuid {
            query.push(" AND deployment_uuid = ").push_bind(deployment_uuid);
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<TaskRow>()
            .fetch_all(&mut *conn)
            .await
            .map_err(storage)?;
        collect(rows)
    }

    async fn delete(&self, uuid: &str, status: Option<TaskStatus>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("DELETE FROM task_results WHERE task_uuid = ?")
            .bind(uuid)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("DELETE FROM tasks WHERE uuid = ");
        query.push_bind(uuid);
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }

        let result = query.build().execute(&mut *tx).await.map_err(storage)?;
        if result.rows_affected() == 0 {
            let required = status.map(|s| s.as_str().to_string()).unwrap_or_default();
            // Dropping the transaction restores the result rows.
            return Err(guard_failure(&mut tx, uuid, required).await);
        }

        tx.commit().await.map_err(storage)?;
        debug!(uuid, "Task deleted");
        Ok(())
    }

    async fn create_result(
        &self,
        task_uuid: &str,
        key: Value,
        data: Value,
    ) -> Result<TaskResult, RepositoryError> {
        let now = Utc::now();
        let row: TaskResultRow = sqlx::query_as(&format!(
            "INSERT INTO task_results (task_uuid, key, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {TASK_RESULT_COLUMNS}"
        ))
        .bind(task_uuid)
        .bind(encode_json(&key)?)
        .bind(encode_json(&data)?)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::ForeignKey => RepositoryError::not_found(EntityKind::Task, task_uuid),
            _ => storage(e),
        })?;

        row.try_into()
    }

    async fn results(&self, task_uuid: &str) -> Result<Vec<TaskResult>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        fetch_results(&mut conn, task_uuid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Migrator;
    use crate::repositories::SqliteDeploymentRepository;
    use crate::test_pool;
    use rally_core::{DeploymentRepository, NewDeployment};
    use serde_json::json;

    async fn setup() -> (SqliteTaskRepository, String) {
        let pool = test_pool().await;
        Migrator::new(pool.clone()).create_from_models().await.unwrap();
        let deployment = SqliteDeploymentRepository::new(pool.clone())
            .create(NewDeployment::new("dep-a"))
            .await
            .unwrap();
        (SqliteTaskRepository::new(pool), deployment.uuid)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, dep) = setup().await;

        let created = repo
            .create(NewTask::new(dep.clone()).with_tag("nightly"))
            .await
            .unwrap();
        let fetched = repo.get(&created.uuid).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.status, TaskStatus::Init);
        assert_eq!(fetched.tag.as_deref(), Some("nightly"));
        assert_eq!(fetched.verification_log, json!([]));
        assert_eq!(fetched.deployment_uuid, dep);
    }

    #[tokio::test]
    async fn test_create_for_unknown_deployment_is_not_found() {
        let (repo, _dep) = setup().await;
        let err = repo.create(NewTask::new("ghost")).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::NotFound { kind: EntityKind::Deployment, .. }
        ));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (repo, _dep) = setup().await;
        assert!(repo.get("nope").await.unwrap_err().is_not_found());
        assert!(repo.get_status("nope").await.unwrap_err().is_not_found());
        assert!(repo.get_detailed("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_detailed_includes_results_in_order() {
        let (repo, dep) = setup().await;
        let task = repo.create(NewTask::new(dep)).await.unwrap();

        repo.create_result(&task.uuid, json!({"name": "a"}), json!({"raw": [1]}))
            .await
            .unwrap();
        repo.create_result(&task.uuid, json!({"name": "b"}), json!({"raw": [2]}))
            .await
            .unwrap();

        let detailed = repo.get_detailed(&task.uuid).await.unwrap();
        assert_eq!(detailed.task.uuid, task.uuid);
        let keys: Vec<_> = detailed.results.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys, vec![json!({"name": "a"}), json!({"name": "b"})]);
    }

    #[tokio::test]
    async fn test_detailed_last_picks_newest() {
        let (repo, dep) = setup().await;
        assert!(repo.get_detailed_last().await.unwrap().is_none());

        repo.create(NewTask::new(dep.clone())).await.unwrap();
        let newest = repo.create(NewTask::new(dep)).await.unwrap();

        let last = repo.get_detailed_last().await.unwrap().unwrap();
        assert_eq!(last.task.uuid, newest.uuid);
        assert!(last.results.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (repo, dep) = setup().await;
        let task = repo.create(NewTask::new(dep).with_tag("old")).await.unwrap();

        let updated = repo
            .update(
                &task.uuid,
                TaskUpdate {
                    verification_log: Some(json!(["checked"])),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.tag.as_deref(), Some("old"));
        assert_eq!(updated.verification_log, json!(["checked"]));
        assert_eq!(repo.get(&task.uuid).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_status_respects_allowed_statuses() {
        let (repo, dep) = setup().await;
        let task = repo.create(NewTask::new(dep)).await.unwrap();

        repo.update_status(
            &task.uuid,
            &[TaskStatus::Init, TaskStatus::Verifying],
            TaskStatus::Running,
        )
        .await
        .unwrap();
        assert_eq!(repo.get_status(&task.uuid).await.unwrap(), TaskStatus::Running);

        let err = repo
            .update_status(&task.uuid, &[TaskStatus::Init], TaskStatus::Finished)
            .await
            .unwrap_err();
        match err {
            RepositoryError::InvalidStatus {
                required, actual, ..
            } => {
                assert_eq!(required, "init");
                assert_eq!(actual, "running");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = repo
            .update_status("nope", &[TaskStatus::Init], TaskStatus::Running)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_deployment() {
        let (repo, dep) = setup().await;
        let first = repo.create(NewTask::new(dep.clone())).await.unwrap();
        repo.create(NewTask::new(dep.clone())).await.unwrap();
        repo.update_status(&first.uuid, &[TaskStatus::Init], TaskStatus::Finished)
            .await
            .unwrap();

        assert_eq!(repo.list(None, None).await.unwrap().len(), 2);
        assert_eq!(repo.list(None, Some("dep-a")).await.unwrap().len(), 2);
        assert_eq!(repo.list(None, Some(&dep)).await.unwrap().len(), 2);

        let finished = repo
            .list(Some(TaskStatus::Finished), Some("dep-a"))
            .await
            .unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].uuid, first.uuid);

        assert!(repo.list(None, Some("ghost")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_removes_results() {
        let (repo, dep) = setup().await;
        let task = repo.create(NewTask::new(dep)).await.unwrap();
        repo.create_result(&task.uuid, json!("k"), json!("v"))
            .await
            .unwrap();

        repo.delete(&task.uuid, None).await.unwrap();

        assert!(repo.get(&task.uuid).await.unwrap_err().is_not_found());
        assert!(repo.results(&task.uuid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_wrong_status_keeps_task() {
        let (repo, dep) = setup().await;
        let task = repo.create(NewTask::new(dep)).await.unwrap();
        repo.create_result(&task.uuid, json!("k"), json!("v"))
            .await
            .unwrap();

        let err = repo
            .delete(&task.uuid, Some(TaskStatus::Finished))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InvalidStatus { ref required, ref actual, .. }
                if required == "finished" && actual == "init"
        ));
        assert_eq!(repo.results(&task.uuid).await.unwrap().len(), 1);

        repo.delete(&task.uuid, Some(TaskStatus::Init)).await.unwrap();
        assert!(repo.delete(&task.uuid, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_result_for_unknown_task_is_not_found() {
        let (repo, _dep) = setup().await;
        let err = repo
            .create_result("ghost", json!("k"), json!("v"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::NotFound { kind: EntityKind::Task, .. }
        ));
    }
}
