//! Verification domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Init,
    Running,
    Finished,
    Failed,
}

impl VerificationStatus {
    /// Parse a status from its stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Self::Init),
            "running" => Some(Self::Running),
            "finished" => Some(Self::Finished),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Convert status to its stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub id: i64,
    pub uuid: String,
    pub deployment_uuid: String,
    pub status: VerificationStatus,
    pub set_name: Option<String>,
    pub tests: i64,
    pub failures: i64,
    pub errors: i64,
    /// Total run time in seconds.
    pub time: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The result payload of a verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: i64,
    pub verification_uuid: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a verification.
#[derive(Debug, Clone, Default)]
pub struct VerificationUpdate {
    pub status: Option<VerificationStatus>,
    pub set_name: Option<Option<String>>,
    pub tests: Option<i64>,
    pub failures: Option<i64>,
    pub errors: Option<i64>,
    pub time: Option<f64>,
}

impl VerificationUpdate {
    /// An update that only changes the status.
    #[must_use]
    pub fn status(status: VerificationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge this update onto an existing verification.
    pub fn apply(self, verification: &mut Verification) {
        if let Some(status) = self.status {
            verification.status = status;
        }
        if let Some(set_name) = self.set_name {
            verification.set_name = set_name;
        }
        if let Some(tests) = self.tests {
            verification.tests = tests;
        }
        if let Some(failures) = self.failures {
            verification.failures = failures;
        }
        if let Some(errors) = self.errors {
            verification.errors = errors;
        }
        if let Some(time) = self.time {
            verification.time = time;
        }
    }
}
