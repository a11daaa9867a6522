// tests/pipeline_teardown.rs

mod common;
use crate::common::{init_tracing, TreeBuilder};

use std::path::PathBuf;

use benchrunner::errors::BenchError;
use benchrunner::exec::{ExistingHostBackend, SshTarget};
use benchrunner::filter::OutputFilter;
use benchrunner::fs::RealFileSystem;
use benchrunner::pipeline::{Pipeline, RunRequest};
use benchrunner::progress::Progress;
use benchrunner::stage::WORKSPACE_PREFIX;
use benchrunner::teardown::WorkspaceCleanup;
use benchrunner::types::RemoteCleanup;
use benchrunner_test_utils::{FailingBackend, FakeTransport, StaticBackend, StaticLocator};

fn request(command: &str) -> RunRequest {
    RunRequest {
        command: command.to_string(),
        folder: None,
    }
}

fn leftover_workspaces(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(WORKSPACE_PREFIX))
        .collect()
}

#[tokio::test]
async fn workspace_is_removed_after_backend_failure() {
    init_tracing();
    let tree = TreeBuilder::new().file("input.txt", "payload");
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = FailingBackend::new();

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(&request("cat input.txt"), &mut backend)
        .await;

    assert!(matches!(outcome.result, Err(BenchError::Remote { .. })));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.workspace_cleanup, Some(WorkspaceCleanup::Removed));

    let root = outcome.workspace_root.expect("workspace was created");
    assert!(!root.exists(), "workspace {root:?} should be gone");
    assert!(leftover_workspaces(&tree.root()).is_empty());

    let seen = backend.seen().expect("backend ran");
    assert!(seen.existed);
    assert_eq!(seen.root, root);
    assert_eq!(seen.entries, vec!["input.txt"]);
}

#[tokio::test]
async fn successful_run_filters_output_and_cleans_up() {
    let tree = TreeBuilder::new().file("data/input.txt", "payload");
    let scratch = TreeBuilder::new();
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = StaticBackend::new(
        OutputFilter::Sentinel,
        "Warning: Permanently added host\nBENCHMARK_START\nRun 1\nRemote-Output: 42\nBENCHMARK_END\nnoise",
    );

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .with_workspace_parent(scratch.root())
        .execute(&request("wc -c data/input.txt"), &mut backend)
        .await;

    assert_eq!(outcome.exit_code(), 0);
    let output = outcome.result.expect("run succeeded");
    assert_eq!(output.filtered_output, b"Run 1\n42\n".to_vec());
    assert_eq!(output.rewritten_command, "wc -c input.txt");
    assert_eq!(output.remote_cleanup, RemoteCleanup::NotApplicable);

    let root = outcome.workspace_root.unwrap();
    assert!(root.starts_with(scratch.root()));
    assert!(!root.exists());

    let seen = backend.seen().unwrap();
    assert_eq!(seen.command, "wc -c input.txt");
    assert_eq!(seen.entries, vec!["input.txt"]);
}

#[tokio::test]
async fn cleanup_problems_do_not_change_a_successful_run() {
    let tree = TreeBuilder::new();
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = StaticBackend::new(OutputFilter::TagOnly, "Remote-Output: ok\n")
        .with_remote_cleanup(RemoteCleanup::Failed {
            error: "destroy exited with code 1".to_string(),
            recovery: "cd /tpl && terraform destroy".to_string(),
        });

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(&request("true"), &mut backend)
        .await;

    assert_eq!(outcome.exit_code(), 0);
    let output = outcome.result.unwrap();
    assert_eq!(output.filtered_output, b"ok\n".to_vec());
    assert_eq!(
        output.remote_cleanup.recovery(),
        Some("cd /tpl && terraform destroy")
    );
}

#[tokio::test]
async fn missing_folder_fails_before_any_side_effect() {
    let tree = TreeBuilder::new();
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = FailingBackend::new();

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(
            &RunRequest {
                command: "ls".to_string(),
                folder: Some(PathBuf::from("does-not-exist")),
            },
            &mut backend,
        )
        .await;

    match &outcome.result {
        Err(BenchError::InvalidInput(msg)) => assert!(msg.contains("does-not-exist")),
        other => panic!("Expected InvalidInput, got: {:?}", other),
    }
    assert!(outcome.workspace_root.is_none());
    assert!(outcome.workspace_cleanup.is_none());
    assert!(backend.seen().is_none());
    assert!(leftover_workspaces(&tree.root()).is_empty());
}

#[tokio::test]
async fn folder_that_is_a_file_is_rejected() {
    let tree = TreeBuilder::new().file("notes.txt", "x");
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = FailingBackend::new();

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(
            &RunRequest {
                command: "ls".to_string(),
                folder: Some(PathBuf::from("notes.txt")),
            },
            &mut backend,
        )
        .await;

    match &outcome.result {
        Err(BenchError::InvalidInput(msg)) => assert!(msg.contains("not a directory")),
        other => panic!("Expected InvalidInput, got: {:?}", other),
    }
    assert!(backend.seen().is_none());
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let tree = TreeBuilder::new();
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let mut backend = FailingBackend::new();

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(&request("  &&  "), &mut backend)
        .await;

    assert!(matches!(outcome.result, Err(BenchError::InvalidInput(_))));
    assert!(outcome.workspace_root.is_none());
}

#[tokio::test]
async fn missing_ssh_key_fails_before_any_side_effect() {
    let tree = TreeBuilder::new();
    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let transport = FakeTransport::new();
    let target = SshTarget {
        host: "10.0.0.5".to_string(),
        user: "ubuntu".to_string(),
        key: Some(tree.path("missing.pem")),
        connect_timeout: std::time::Duration::from_secs(5),
    };
    let mut backend =
        ExistingHostBackend::new(transport.clone(), target, "benchmark", progress.clone());

    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(&request("ls"), &mut backend)
        .await;

    match &outcome.result {
        Err(BenchError::InvalidInput(msg)) => assert!(msg.contains("missing.pem")),
        other => panic!("Expected InvalidInput, got: {:?}", other),
    }
    assert!(transport.calls().is_empty());
    assert!(leftover_workspaces(&tree.root()).is_empty());
}
