//! Integration tests for the repositories working together over one database.

use rally_core::{
    DatabaseConfig, DeploymentStatus, DeploymentUpdate, EntityKind, NewDeployment, NewResource,
    NewTask, NewWorker, RepositoryError, TaskStatus, generate_uuid,
};
use rally_db::{Migrator, RepoFactory, TestDb, configure_engine, reset_engine};
use serde_json::json;

#[tokio::test]
async fn test_deployment_with_resources_cannot_be_deleted() {
    let db = TestDb::new().await.unwrap();
    let repos = db.repos();

    let deployment = repos
        .deployments
        .create(NewDeployment::new("dep-a"))
        .await
        .unwrap();
    let resource = repos
        .resources
        .create(
            NewResource::new(deployment.uuid.clone())
                .with_provider("r1")
                .with_info(json!({"server": "vm-1"})),
        )
        .await
        .unwrap();

    let err = repos.deployments.delete(&deployment.uuid).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Busy { kind: EntityKind::Deployment, ref id } if *id == deployment.uuid
    ));
    assert!(repos.deployments.get("dep-a").await.is_ok());

    repos.resources.delete(resource.id).await.unwrap();
    repos.deployments.delete(&deployment.uuid).await.unwrap();

    assert!(repos.deployments.list(None, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_deployment_removes_its_tasks_and_results() {
    let db = TestDb::new().await.unwrap();
    let repos = db.repos();

    let deployment = repos
        .deployments
        .create(NewDeployment::new("dep-a"))
        .await
        .unwrap();
    let task = repos
        .tasks
        .create(NewTask::new(deployment.uuid.clone()))
        .await
        .unwrap();
    repos
        .tasks
        .create_result(&task.uuid, json!({"name": "scenario"}), json!({"raw": []}))
        .await
        .unwrap();
    let verification = repos.verifications.create(&deployment.uuid).await.unwrap();

    repos.deployments.delete(&deployment.uuid).await.unwrap();

    assert!(repos.tasks.get(&task.uuid).await.unwrap_err().is_not_found());
    assert!(repos.tasks.results(&task.uuid).await.unwrap().is_empty());
    assert!(
        repos
            .verifications
            .get(&verification.uuid)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_unique_keys_are_reported_as_conflicts() {
    let db = TestDb::new().await.unwrap();
    let repos = db.repos();

    let first = repos
        .deployments
        .create(NewDeployment::new("dep-a"))
        .await
        .unwrap();

    let mut same_uuid = NewDeployment::new("dep-b");
    same_uuid.uuid.clone_from(&first.uuid);
    assert!(matches!(
        repos.deployments.create(same_uuid).await.unwrap_err(),
        RepositoryError::AlreadyExists { ref key, .. } if *key == first.uuid
    ));

    // Renaming onto a taken name is a conflict too.
    repos
        .deployments
        .create(NewDeployment::new("dep-c"))
        .await
        .unwrap();
    let err = repos
        .deployments
        .update(
            "dep-c",
            DeploymentUpdate {
                name: Some("dep-a".to_string()),
                ..DeploymentUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists { ref key, .. } if key == "dep-a"));

    let task = NewTask::new(first.uuid.clone());
    let duplicate = NewTask {
        uuid: task.uuid.clone(),
        ..NewTask::new(first.uuid.clone())
    };
    repos.tasks.create(task).await.unwrap();
    assert!(matches!(
        repos.tasks.create(duplicate).await.unwrap_err(),
        RepositoryError::AlreadyExists { kind: EntityKind::Task, .. }
    ));

    repos.workers.register(NewWorker::new("node-1")).await.unwrap();
    assert!(matches!(
        repos.workers.register(NewWorker::new("node-1")).await.unwrap_err(),
        RepositoryError::AlreadyExists { kind: EntityKind::Worker, .. }
    ));
}

#[tokio::test]
async fn test_task_lifecycle_through_statuses() {
    let db = TestDb::new().await.unwrap();
    let repos = db.repos();
    let deployment = repos
        .deployments
        .create(NewDeployment::new("dep-a"))
        .await
        .unwrap();
    repos
        .deployments
        .update(
            &deployment.uuid,
            DeploymentUpdate::status(DeploymentStatus::DeployFinished),
        )
        .await
        .unwrap();

    let task = repos
        .tasks
        .create(NewTask::new(deployment.uuid.clone()).with_tag("smoke"))
        .await
        .unwrap();

    for (from, to) in [
        (TaskStatus::Init, TaskStatus::Verifying),
        (TaskStatus::Verifying, TaskStatus::Running),
        (TaskStatus::Running, TaskStatus::Finished),
    ] {
        repos.tasks.update_status(&task.uuid, &[from], to).await.unwrap();
    }

    let err = repos
        .tasks
        .update_status(
            &task.uuid,
            &[TaskStatus::Running, TaskStatus::SoftAborting],
            TaskStatus::Aborting,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStatus { ref required, ref actual, .. }
            if required == "running or soft_aborting" && actual == "finished"
    ));

    let finished = repos
        .tasks
        .list(Some(TaskStatus::Finished), Some("dep-a"))
        .await
        .unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].tag.as_deref(), Some("smoke"));
}

#[tokio::test]
async fn test_worker_heartbeat_for_unknown_host_fails() {
    let db = TestDb::new().await.unwrap();
    let workers = db.worker_repository();

    let err = rally_core::WorkerRepository::update(&workers, "ghost")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound { kind: EntityKind::Worker, ref id } if id == "ghost"
    ));
}

#[tokio::test]
async fn test_backend_uses_configured_engine() {
    let dir = tempfile::tempdir().unwrap();
    configure_engine(DatabaseConfig::for_path(&dir.path().join("engine.sqlite"))).await;

    let repos = RepoFactory::backend().unwrap();
    Migrator::new(rally_db::engine().unwrap())
        .upgrade(None)
        .await
        .unwrap();
    let name = generate_uuid();
    repos
        .deployments
        .create(NewDeployment::new(name.clone()))
        .await
        .unwrap();

    // A rebuilt engine sees the same file.
    reset_engine().await;
    let repos = RepoFactory::backend().unwrap();
    assert_eq!(repos.deployments.get(&name).await.unwrap().name, name);

    reset_engine().await;
}
