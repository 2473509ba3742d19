//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (database, filesystem, etc.).
//!
//! # Structure
//!
//! - `task` - Task and task result types (`Task`, `NewTask`, `TaskResult`)
//! - `deployment` - Deployment types and the merged credentials blob
//! - `resource` - Resources owned by a deployment
//! - `verification` - Verification runs and their results
//! - `worker` - Worker registrations with a heartbeat timestamp

mod deployment;
mod resource;
mod task;
mod verification;
mod worker;

pub use deployment::{
    DEFAULT_DEPLOYMENT_TYPE, Deployment, DeploymentCredentials, DeploymentStatus, DeploymentUpdate,
    NewDeployment,
};
pub use resource::{NewResource, Resource};
pub use task::{NewTask, Task, TaskDetailed, TaskResult, TaskStatus, TaskUpdate};
pub use verification::{Verification, VerificationResult, VerificationStatus, VerificationUpdate};
pub use worker::{NewWorker, Worker};

/// Generate a fresh UUID string for a new row.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
