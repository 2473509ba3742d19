//! Task domain types.
//!
//! A task is one benchmark run against a deployment. Its results are
//! stored as separate rows and always removed together with the task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_uuid;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "verifying")]
    Verifying,
    #[serde(rename = "setting up")]
    SettingUp,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "cleaning up")]
    CleaningUp,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "aborting")]
    Aborting,
    #[serde(rename = "soft_aborting")]
    SoftAborting,
    #[serde(rename = "aborted")]
    Aborted,
}

impl TaskStatus {
    /// Parse a status from its stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Self::Init),
            "verifying" => Some(Self::Verifying),
            "setting up" => Some(Self::SettingUp),
            "running" => Some(Self::Running),
            "cleaning up" => Some(Self::CleaningUp),
            "finished" => Some(Self::Finished),
            "failed" => Some(Self::Failed),
            "aborting" => Some(Self::Aborting),
            "soft_aborting" => Some(Self::SoftAborting),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Convert status to its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Verifying => "verifying",
            Self::SettingUp => "setting up",
            Self::Running => "running",
            Self::CleaningUp => "cleaning up",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Aborting => "aborting",
            Self::SoftAborting => "soft_aborting",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Database identity; increases monotonically with creation order.
    pub id: i64,
    pub uuid: String,
    pub status: TaskStatus,
    pub tag: Option<String>,
    /// Free-form log collected while the task input was verified.
    pub verification_log: serde_json::Value,
    pub deployment_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task together with all of its result rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetailed {
    #[serde(flatten)]
    pub task: Task,
    pub results: Vec<TaskResult>,
}

/// One result row attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: i64,
    pub task_uuid: String,
    pub key: serde_json::Value,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub uuid: String,
    pub deployment_uuid: String,
    pub status: TaskStatus,
    pub tag: Option<String>,
    pub verification_log: serde_json::Value,
}

impl NewTask {
    /// A task in `init` status with a freshly generated UUID.
    pub fn new(deployment_uuid: impl Into<String>) -> Self {
        Self {
            uuid: generate_uuid(),
            deployment_uuid: deployment_uuid.into(),
            status: TaskStatus::Init,
            tag: None,
            verification_log: serde_json::Value::Array(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update for a task.
///
/// `uuid` and `deployment_uuid` are not part of the update surface and can
/// never be changed through it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    /// Use `Some(Some(tag))` to set, `Some(None)` to clear, `None` to leave unchanged.
    pub tag: Option<Option<String>>,
    pub verification_log: Option<serde_json::Value>,
}

impl TaskUpdate {
    /// An update that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the update would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.tag.is_none() && self.verification_log.is_none()
    }

    /// Merge this update onto an existing task.
    pub fn apply(self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(tag) = self.tag {
            task.tag = tag;
        }
        if let Some(log) = self.verification_log {
            task.verification_log = log;
        }
    }
}
