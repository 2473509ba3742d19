//! Deployment domain types.
//!
//! A deployment describes one cloud under test. Its admin and user
//! credentials are kept together in a single structured blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_uuid;
use crate::credentials::{CredentialKind, Credentials, CredentialsError};

/// Deployment type assigned when the caller does not provide one.
pub const DEFAULT_DEPLOYMENT_TYPE: &str = "openstack";

/// Lifecycle status of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentStatus {
    #[serde(rename = "deploy->init")]
    DeployInit,
    #[serde(rename = "deploy->started")]
    DeployStarted,
    #[serde(rename = "deploy->subdeploy")]
    DeploySubdeploy,
    #[serde(rename = "deploy->finished")]
    DeployFinished,
    #[serde(rename = "deploy->failed")]
    DeployFailed,
    #[serde(rename = "deploy->inconsistent")]
    DeployInconsistent,
    #[serde(rename = "cleanup->started")]
    CleanupStarted,
    #[serde(rename = "cleanup->failed")]
    CleanupFailed,
    #[serde(rename = "cleanup->finished")]
    CleanupFinished,
}

impl DeploymentStatus {
    /// Parse a status from its stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deploy->init" => Some(Self::DeployInit),
            "deploy->started" => Some(Self::DeployStarted),
            "deploy->subdeploy" => Some(Self::DeploySubdeploy),
            "deploy->finished" => Some(Self::DeployFinished),
            "deploy->failed" => Some(Self::DeployFailed),
            "deploy->inconsistent" => Some(Self::DeployInconsistent),
            "cleanup->started" => Some(Self::CleanupStarted),
            "cleanup->failed" => Some(Self::CleanupFailed),
            "cleanup->finished" => Some(Self::CleanupFinished),
            _ => None,
        }
    }

    /// Convert status to its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeployInit => "deploy->init",
            Self::DeployStarted => "deploy->started",
            Self::DeploySubdeploy => "deploy->subdeploy",
            Self::DeployFinished => "deploy->finished",
            Self::DeployFailed => "deploy->failed",
            Self::DeployInconsistent => "deploy->inconsistent",
            Self::CleanupStarted => "cleanup->started",
            Self::CleanupFailed => "cleanup->failed",
            Self::CleanupFinished => "cleanup->finished",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin and user credentials of a deployment, stored as one blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentCredentials {
    pub admin: Option<serde_json::Map<String, serde_json::Value>>,
    pub users: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// A persisted deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub uuid: String,
    pub parent_uuid: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub deployment_type: String,
    pub status: DeploymentStatus,
    pub config: serde_json::Value,
    pub credentials: DeploymentCredentials,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// The credential kind selected by this deployment's type.
    pub fn credential_kind(&self) -> Result<CredentialKind, CredentialsError> {
        CredentialKind::parse(&self.deployment_type)
            .ok_or_else(|| CredentialsError::UnknownKind(self.deployment_type.clone()))
    }

    /// Validate the stored admin blob against the schema of this deployment's type.
    ///
    /// Returns `Ok(None)` when the deployment has no admin credentials.
    pub fn admin_credentials(&self) -> Result<Option<Credentials>, CredentialsError> {
        let Some(admin) = self.credentials.admin.clone() else {
            return Ok(None);
        };
        Credentials::build(self.credential_kind()?, admin).map(Some)
    }

    /// Validate every stored user blob against the schema of this deployment's type.
    pub fn user_credentials(&self) -> Result<Vec<Credentials>, CredentialsError> {
        let kind = self.credential_kind()?;
        self.credentials
            .users
            .iter()
            .cloned()
            .map(|user| Credentials::build(kind, user))
            .collect()
    }
}

/// Data for creating a new deployment.
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub uuid: String,
    pub name: String,
    pub parent_uuid: Option<String>,
    pub deployment_type: String,
    pub status: DeploymentStatus,
    pub config: serde_json::Value,
    pub credentials: DeploymentCredentials,
}

impl NewDeployment {
    /// A top-level `openstack` deployment in `deploy->init` status.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: generate_uuid(),
            name: name.into(),
            parent_uuid: None,
            deployment_type: DEFAULT_DEPLOYMENT_TYPE.to_string(),
            status: DeploymentStatus::DeployInit,
            config: serde_json::Value::Object(serde_json::Map::new()),
            credentials: DeploymentCredentials::default(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_uuid: impl Into<String>) -> Self {
        self.parent_uuid = Some(parent_uuid.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: DeploymentCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_type(mut self, deployment_type: impl Into<String>) -> Self {
        self.deployment_type = deployment_type.into();
        self
    }
}

/// Partial update for a deployment.
///
/// The UUID is not part of the update surface; a deployment keeps its
/// identity for its whole life.
#[derive(Debug, Clone, Default)]
pub struct DeploymentUpdate {
    pub name: Option<String>,
    pub status: Option<DeploymentStatus>,
    pub deployment_type: Option<String>,
    pub config: Option<serde_json::Value>,
    pub credentials: Option<DeploymentCredentials>,
    pub parent_uuid: Option<Option<String>>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl DeploymentUpdate {
    /// An update that only changes the status.
    #[must_use]
    pub fn status(status: DeploymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge this update onto an existing deployment.
    pub fn apply(self, deployment: &mut Deployment) {
        if let Some(name) = self.name {
            deployment.name = name;
        }
        if let Some(status) = self.status {
            deployment.status = status;
        }
        if let Some(deployment_type) = self.deployment_type {
            deployment.deployment_type = deployment_type;
        }
        if let Some(config) = self.config {
            deployment.config = config;
        }
        if let Some(credentials) = self.credentials {
            deployment.credentials = credentials;
        }
        if let Some(parent_uuid) = self.parent_uuid {
            deployment.parent_uuid = parent_uuid;
        }
        if let Some(started_at) = self.started_at {
            deployment.started_at = started_at;
        }
        if let Some(completed_at) = self.completed_at {
            deployment.completed_at = completed_at;
        }
    }
}
