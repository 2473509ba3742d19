//! Task repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewTask, Task, TaskDetailed, TaskResult, TaskStatus, TaskUpdate};

/// Repository for tasks and their result rows.
///
/// # Design Rules
///
/// - A task and its results are always deleted in one transaction
/// - `update` merges the given fields; the UUID is immutable
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task.
    ///
    /// Returns `Err(RepositoryError::AlreadyExists)` if the UUID is taken.
    async fn create(&self, task: NewTask) -> Result<Task, RepositoryError>;

    /// Get a task by UUID.
    async fn get(&self, uuid: &str) -> Result<Task, RepositoryError>;

    /// Get a task by UUID together with all of its results.
    async fn get_detailed(&self, uuid: &str) -> Result<TaskDetailed, RepositoryError>;

    /// Get only the status of a task.
    async fn get_status(&self, uuid: &str) -> Result<TaskStatus, RepositoryError>;

    /// The most recently created task (highest id) with its results, if any.
    async fn get_detailed_last(&self) -> Result<Option<TaskDetailed>, RepositoryError>;

    /// Merge `update` onto the task and return the updated row.
    async fn update(&self, uuid: &str, update: TaskUpdate) -> Result<Task, RepositoryError>;

    /// Set the status only if the current status is one of `allowed`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `InvalidStatus` if the task is in none of the allowed statuses
    async fn update_status(
        &self,
        uuid: &str,
        allowed: &[TaskStatus],
        status: TaskStatus,
    ) -> Result<(), RepositoryError>;

    /// List tasks, optionally filtered by status and by deployment.
    ///
    /// `deployment` accepts a deployment name or UUID; an unknown deployment
    /// is `NotFound`.
    async fn list(
        &self,
        status: Option<TaskStatus>,
        deployment: Option<&str>,
    ) -> Result<Vec<Task>, RepositoryError>;

    /// Delete a task and all of its results.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `InvalidStatus` if `status` is given and the task is in another one
    async fn delete(&self, uuid: &str, status: Option<TaskStatus>) -> Result<(), RepositoryError>;

    /// Attach a result row to a task.
    async fn create_result(
        &self,
        task_uuid: &str,
        key: serde_json::Value,
        data: serde_json::Value,
    ) -> Result<TaskResult, RepositoryError>;

    /// All result rows of a task, in insertion order.
    async fn results(&self, task_uuid: &str) -> Result<Vec<TaskResult>, RepositoryError>;
}
