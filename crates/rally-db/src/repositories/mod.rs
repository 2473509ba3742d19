//! Repository implementations using `SQLite`.
//!
//! These implementations encapsulate all SQL queries and database access.
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod row_mappers;
mod sqlite_deployment_repository;
mod sqlite_resource_repository;
mod sqlite_task_repository;
mod sqlite_verification_repository;
mod sqlite_worker_repository;

pub use sqlite_deployment_repository::SqliteDeploymentRepository;
pub use sqlite_resource_repository::SqliteResourceRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_verification_repository::SqliteVerificationRepository;
pub use sqlite_worker_repository::SqliteWorkerRepository;
