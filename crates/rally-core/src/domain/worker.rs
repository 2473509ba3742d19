//! Worker registration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered worker host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub hostname: String,
    pub created_at: DateTime<Utc>,
    /// Last heartbeat.
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a worker.
#[derive(Debug, Clone)]
pub struct NewWorker {
    pub hostname: String,
}

impl NewWorker {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}
