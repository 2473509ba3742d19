//! Row types and mapping helpers for `SQLite` queries.
//!
//! JSON payloads are stored as TEXT and timestamps as RFC 3339 TEXT.

use chrono::{DateTime, Utc};
use rally_core::{
    Deployment, DeploymentCredentials, DeploymentStatus, EntityKind, RepositoryError, Resource,
    Task, TaskResult, TaskStatus, Verification, VerificationResult, VerificationStatus, Worker,
};
use serde_json::Value;

pub const TASK_COLUMNS: &str =
    "id, uuid, status, tag, verification_log, deployment_uuid, created_at, updated_at";
pub const TASK_RESULT_COLUMNS: &str = "id, task_uuid, key, data, created_at, updated_at";
pub const DEPLOYMENT_COLUMNS: &str = "id, uuid, parent_uuid, name, type, status, config, credentials, started_at, completed_at, created_at, updated_at";
pub const RESOURCE_COLUMNS: &str =
    "id, provider_name, type, info, deployment_uuid, created_at, updated_at";
pub const VERIFICATION_COLUMNS: &str = "id, uuid, deployment_uuid, status, set_name, tests, failures, errors, time, created_at, updated_at";
pub const VERIFICATION_RESULT_COLUMNS: &str =
    "id, verification_uuid, data, created_at, updated_at";
pub const WORKER_COLUMNS: &str = "id, hostname, created_at, updated_at";

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Map any `SQLx` error to a storage error.
pub fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Constraint class of a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Unique,
    ForeignKey,
    Other,
}

pub fn violation(e: &sqlx::Error) -> Violation {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => Violation::Unique,
        Some(db) if db.is_foreign_key_violation() => Violation::ForeignKey,
        _ => Violation::Other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn decode_json(raw: &str, column: &str) -> Result<Value, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::Serialization(format!("{column}: {e}")))
}

pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn unknown_status(kind: EntityKind, status: &str) -> RepositoryError {
    RepositoryError::Serialization(format!("unknown {kind} status '{status}'"))
}

pub fn parse_task_status(status: &str) -> Result<TaskStatus, RepositoryError> {
    TaskStatus::parse(status).ok_or_else(|| unknown_status(EntityKind::Task, status))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
pub struct TaskRow {
    id: i64,
    uuid: String,
    status: String,
    tag: Option<String>,
    verification_log: String,
    deployment_uuid: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            status: parse_task_status(&row.status)?,
            verification_log: decode_json(&row.verification_log, "tasks.verification_log")?,
            uuid: row.uuid,
            tag: row.tag,
            deployment_uuid: row.deployment_uuid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct TaskResultRow {
    id: i64,
    task_uuid: String,
    key: String,
    data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskResultRow> for TaskResult {
    type Error = RepositoryError;

    fn try_from(row: TaskResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            task_uuid: row.task_uuid,
            key: decode_json(&row.key, "task_results.key")?,
            data: decode_json(&row.data, "task_results.data")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct DeploymentRow {
    id: i64,
    uuid: String,
    parent_uuid: Option<String>,
    name: String,
    #[sqlx(rename = "type")]
    deployment_type: String,
    status: String,
    config: String,
    credentials: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeploymentRow> for Deployment {
    type Error = RepositoryError;

    fn try_from(row: DeploymentRow) -> Result<Self, Self::Error> {
        let status = DeploymentStatus::parse(&row.status)
            .ok_or_else(|| unknown_status(EntityKind::Deployment, &row.status))?;
        let credentials: DeploymentCredentials = serde_json::from_str(&row.credentials)
            .map_err(|e| RepositoryError::Serialization(format!("deployments.credentials: {e}")))?;

        Ok(Self {
            id: row.id,
            uuid: row.uuid,
            parent_uuid: row.parent_uuid,
            name: row.name,
            deployment_type: row.deployment_type,
            status,
            config: decode_json(&row.config, "deployments.config")?,
            credentials,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct ResourceRow {
    id: i64,
    provider_name: Option<String>,
    #[sqlx(rename = "type")]
    resource_type: Option<String>,
    info: String,
    deployment_uuid: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = RepositoryError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            provider_name: row.provider_name,
            resource_type: row.resource_type,
            info: decode_json(&row.info, "resources.info")?,
            deployment_uuid: row.deployment_uuid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct VerificationRow {
    id: i64,
    uuid: String,
    deployment_uuid: String,
    status: String,
    set_name: Option<String>,
    tests: i64,
    failures: i64,
    errors: i64,
    time: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VerificationRow> for Verification {
    type Error = RepositoryError;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        let status = VerificationStatus::parse(&row.status)
            .ok_or_else(|| unknown_status(EntityKind::Verification, &row.status))?;
        Ok(Self {
            id: row.id,
            uuid: row.uuid,
            deployment_uuid: row.deployment_uuid,
            status,
            set_name: row.set_name,
            tests: row.tests,
            failures: row.failures,
            errors: row.errors,
            time: row.time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct VerificationResultRow {
    id: i64,
    verification_uuid: String,
    data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VerificationResultRow> for VerificationResult {
    type Error = RepositoryError;

    fn try_from(row: VerificationResultRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            verification_uuid: row.verification_uuid,
            data: decode_json(&row.data, "verification_results.data")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct WorkerRow {
    id: i64,
    hostname: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkerRow> for Worker {
    fn from(row: WorkerRow) -> Self {
        Self {
            id: row.id,
            hostname: row.hostname,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Convert a batch of rows, failing on the first bad one.
pub fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, RepositoryError>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}
