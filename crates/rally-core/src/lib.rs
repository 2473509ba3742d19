//! Core domain types and port definitions for the rally database layer.
//!
//! This crate holds everything that does not depend on a storage engine:
//!
//! - [`domain`] - tasks, deployments, resources, verifications and workers
//! - [`ports`] - repository traits and the shared error taxonomy
//! - [`credentials`] - schema-validated credential bags
//! - [`config`] - database connection configuration
//!
//! The `SQLite` implementation of the ports lives in `rally-db`.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod credentials;
pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{ConfigError, DatabaseConfig, default_database_path};
pub use credentials::{
    CredentialKind, Credentials, CredentialsError, GenericCredentials, OpenStackCredentials,
};
pub use domain::{
    DEFAULT_DEPLOYMENT_TYPE, Deployment, DeploymentCredentials, DeploymentStatus, DeploymentUpdate,
    NewDeployment, NewResource, NewTask, NewWorker, Resource, Task, TaskDetailed, TaskResult,
    TaskStatus, TaskUpdate, Verification, VerificationResult, VerificationStatus,
    VerificationUpdate, Worker, generate_uuid,
};
pub use ports::{
    CoreError, DeploymentRepository, EntityKind, Repos, RepositoryError, ResourceRepository,
    TaskRepository, VerificationRepository, WorkerRepository,
};
