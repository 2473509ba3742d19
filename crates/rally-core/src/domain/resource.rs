//! Resource domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resource provisioned for a deployment.
///
/// While any resource references a deployment, that deployment cannot be
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub provider_name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub info: serde_json::Value,
    pub deployment_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub deployment_uuid: String,
    pub provider_name: Option<String>,
    pub resource_type: Option<String>,
    pub info: serde_json::Value,
}

impl NewResource {
    pub fn new(deployment_uuid: impl Into<String>) -> Self {
        Self {
            deployment_uuid: deployment_uuid.into(),
            provider_name: None,
            resource_type: None,
            info: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }
}
