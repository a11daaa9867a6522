// tests/existing_host_backend.rs

mod common;
use crate::common::{init_tracing, TreeBuilder};

use std::time::Duration;

use benchrunner::errors::BenchError;
use benchrunner::exec::script::{sentinel_script, tagged_command, SCRIPT_NAME};
use benchrunner::exec::{ExecutionBackend, ExistingHostBackend, ProcessOutput, SshTarget};
use benchrunner::fs::RealFileSystem;
use benchrunner::pipeline::{Pipeline, RunRequest};
use benchrunner::progress::Progress;
use benchrunner::types::RemoteCleanup;
use benchrunner_test_utils::{FakeTransport, StaticLocator, TransportCall};

fn target() -> SshTarget {
    SshTarget {
        host: "10.0.0.5".to_string(),
        user: "ubuntu".to_string(),
        key: None,
        connect_timeout: Duration::from_secs(5),
    }
}

fn output(exit_code: i32, text: &str) -> ProcessOutput {
    ProcessOutput {
        output: text.as_bytes().to_vec(),
        exit_code: Some(exit_code),
        success: exit_code == 0,
    }
}

const REMOTE_LOG: &str = "BENCHMARK_START\nRun 1\n3\nRun 2\n3\nRun 3\n3\nBENCHMARK_END\n";

#[tokio::test]
async fn copies_then_runs_the_sentinel_script() {
    init_tracing();
    let tree = TreeBuilder::new().file("input.txt", "a b c");
    let transport = FakeTransport::new().with_run_output(output(0, REMOTE_LOG));
    let mut backend =
        ExistingHostBackend::new(transport.clone(), target(), "benchmark", Progress::hidden());

    let fs = RealFileSystem::with_current_dir(tree.root());
    let locator = StaticLocator::new();
    let progress = Progress::hidden();
    let outcome = Pipeline::new(&fs, &locator, &progress)
        .execute(
            &RunRequest {
                command: format!("wc -w {}", tree.path("input.txt").display()),
                folder: None,
            },
            &mut backend,
        )
        .await;

    assert_eq!(outcome.exit_code(), 0);
    let result = outcome.result.unwrap();
    assert_eq!(
        result.filtered_output,
        b"Run 1\n3\nRun 2\n3\nRun 3\n3\n".to_vec()
    );
    assert_eq!(result.remote_cleanup, RemoteCleanup::NotApplicable);

    let calls = transport.calls();
    assert_eq!(
        calls,
        vec![
            TransportCall::Mkdir {
                remote_dir: "/home/ubuntu/benchmark".to_string()
            },
            TransportCall::Copy {
                remote_dir: "/home/ubuntu/benchmark".to_string(),
                entries: vec!["input.txt".to_string(), SCRIPT_NAME.to_string()],
            },
            TransportCall::RunScript {
                remote_script: "/home/ubuntu/benchmark/run_benchmark.sh".to_string(),
            },
        ]
    );
}

#[cfg(unix)]
#[test]
fn script_survives_a_command_that_reads_stdin() {
    use std::process::{Command, Stdio};

    use benchrunner::filter::OutputFilter;

    let dir = TreeBuilder::new();
    let script_path = dir.path(SCRIPT_NAME);
    std::fs::write(
        &script_path,
        sentinel_script(&dir.root().to_string_lossy(), "cat"),
    )
    .unwrap();

    let out = Command::new("bash")
        .arg(&script_path)
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(out.status.success());
    assert_eq!(
        OutputFilter::Sentinel.apply(&out.stdout),
        b"Run 1\nRun 2\nRun 3\n".to_vec()
    );
}

#[test]
fn sentinel_script_runs_the_command_three_times() {
    let script = sentinel_script("/home/ubuntu/benchmark", "./bench --quick");

    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("cd /home/ubuntu/benchmark || exit 1\n"));
    assert_eq!(script.matches("./bench --quick\n").count(), 3);
    let start = script.find("BENCHMARK_START").unwrap();
    let run1 = script.find("Run 1").unwrap();
    let run3 = script.find("Run 3").unwrap();
    let end = script.find("BENCHMARK_END").unwrap();
    assert!(start < run1 && run1 < run3 && run3 < end);
}

#[test]
fn sentinel_script_quotes_the_remote_dir() {
    let script = sentinel_script("/srv/my bench", "true");
    assert!(script.contains("cd '/srv/my bench' || exit 1\n"));
}

#[test]
fn tagged_command_labels_every_run() {
    let cmd = tagged_command("./bench");
    assert_eq!(cmd.matches("{ ./bench; } 2>&1 | sed").count(), 3);
    for run in 1..=3 {
        assert!(cmd.contains(&format!("echo 'Remote-Output: Run {run}'")));
    }
    assert!(cmd.contains("'s/^/Remote-Output: /'"));
}

#[test]
fn relative_remote_dir_lives_in_the_users_home() {
    let t = target();
    assert_eq!(t.remote_path("benchmark"), "/home/ubuntu/benchmark");
    assert_eq!(t.remote_path("/opt/bench"), "/opt/bench");
    assert_eq!(t.destination(), "ubuntu@10.0.0.5");
}

#[tokio::test]
async fn mkdir_failure_has_nothing_to_clean_up() {
    let workspace = TreeBuilder::new();
    let transport = FakeTransport::new().failing_mkdir();
    let mut backend =
        ExistingHostBackend::new(transport.clone(), target(), "benchmark", Progress::hidden());

    let err = backend.run(&workspace.root(), "true").await.unwrap_err();

    assert!(matches!(err, BenchError::Remote { recovery: None, .. }));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn copy_failure_reports_a_cleanup_command() {
    let workspace = TreeBuilder::new().file("a.txt", "x");
    let transport = FakeTransport::new().failing_copy();
    let mut backend =
        ExistingHostBackend::new(transport.clone(), target(), "benchmark", Progress::hidden());

    let err = backend.run(&workspace.root(), "true").await.unwrap_err();

    assert!(matches!(err, BenchError::Remote { .. }));
    assert_eq!(
        err.recovery(),
        Some("ssh ubuntu@10.0.0.5 rm -rf /home/ubuntu/benchmark")
    );
    assert!(
        !transport
            .calls()
            .iter()
            .any(|c| matches!(c, TransportCall::RunScript { .. }))
    );
}

#[tokio::test]
async fn failing_script_is_fatal() {
    let workspace = TreeBuilder::new();
    let transport = FakeTransport::new().with_run_output(output(127, "bash: bench: command not found\n"));
    let mut backend =
        ExistingHostBackend::new(transport, target(), "benchmark", Progress::hidden());

    let err = backend.run(&workspace.root(), "bench").await.unwrap_err();

    match &err {
        BenchError::Remote { message, recovery } => {
            assert!(message.contains("127"));
            assert!(recovery.is_some());
        }
        other => panic!("Expected Remote error, got: {:?}", other),
    }
}

#[tokio::test]
async fn script_is_written_into_the_workspace() {
    let workspace = TreeBuilder::new();
    let transport = FakeTransport::new();
    let mut backend =
        ExistingHostBackend::new(transport.clone(), target(), "/opt/bench", Progress::hidden());

    backend.run(&workspace.root(), "true").await.unwrap();

    let script = std::fs::read_to_string(workspace.path(SCRIPT_NAME)).unwrap();
    assert_eq!(script, sentinel_script("/opt/bench", "true"));
    assert_eq!(backend.remote_dir(), "/opt/bench");
    assert_eq!(
        transport.calls().last(),
        Some(&TransportCall::RunScript {
            remote_script: "/opt/bench/run_benchmark.sh".to_string()
        })
    );
}

#[test]
fn existing_key_passes_preflight() {
    let tree = TreeBuilder::new().file("id_ed25519", "key");
    let target = SshTarget {
        key: Some(tree.path("id_ed25519")),
        ..target()
    };
    let backend = ExistingHostBackend::new(FakeTransport::new(), target, "benchmark", Progress::hidden());
    assert!(backend.preflight().is_ok());
}
