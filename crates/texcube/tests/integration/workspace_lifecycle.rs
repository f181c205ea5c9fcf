use texcube::config::Engine;
use texcube::workspace::{WORKSPACE_PREFIX, WorkspaceManager};

use super::entries;

#[tokio::test]
async fn test_workspace_acquire_and_release() {
    let scratch = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(scratch.path(), 2);
    let engine = Engine::new("Fake", "/bin/true");

    let workspace = manager
        .acquire(manager.next_request_id(), "\\relax", &engine)
        .await
        .expect("Failed to acquire workspace");

    assert!(workspace.root().exists());
    assert!(
        workspace
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX)
    );
    assert_eq!(std::fs::read(workspace.source_path()).unwrap(), b"\\relax");
    assert_eq!(manager.available(), 1);

    workspace.release().await;

    assert_eq!(entries(scratch.path()), 0);
    assert_eq!(manager.available(), 2);
}

#[tokio::test]
async fn test_workspaces_are_isolated() {
    let scratch = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(scratch.path(), 4);
    let engine = Engine::new("Fake", "/bin/true");

    let first = manager
        .acquire(manager.next_request_id(), "first", &engine)
        .await
        .unwrap();
    let second = manager
        .acquire(manager.next_request_id(), "second", &engine)
        .await
        .unwrap();

    assert_ne!(first.root(), second.root());
    assert_ne!(first.request_id(), second.request_id());
    assert_eq!(first.read_file("main.tex").await.unwrap(), b"first");
    assert_eq!(second.read_file("main.tex").await.unwrap(), b"second");

    first.release().await;
    assert_eq!(entries(scratch.path()), 1);
    second.release().await;
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_workspace_file_names_follow_engine() {
    let scratch = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(scratch.path(), 1);
    let path = format!("{}/configs/valid_full.toml", super::FIXTURES_PATH);
    let config = texcube::Config::from_file(&path).expect("Failed to load config");
    let engine = config.get_engine("xelatex").unwrap();

    let workspace = manager
        .acquire(manager.next_request_id(), "x", engine)
        .await
        .unwrap();

    assert!(workspace.source_path().ends_with("document.tex"));
    assert!(workspace.artifact_path().ends_with("document.pdf"));
    assert!(workspace.log_path().ends_with("document.log"));
    assert!(workspace.file_exists("document.tex").await.unwrap());

    workspace.release().await;
}
