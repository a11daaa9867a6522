use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use benchrunner::errors::{BenchError, Result};
use benchrunner::exec::{BoxFuture, Execution, ExecutionBackend};
use benchrunner::filter::OutputFilter;
use benchrunner::types::RemoteCleanup;

/// What a fake backend saw when `run` was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub root: PathBuf,
    pub existed: bool,
    /// Paths relative to the workspace root, sorted, directories included.
    pub entries: Vec<String>,
    pub command: String,
}

fn snapshot(root: &Path, command: &str) -> WorkspaceSnapshot {
    let mut entries = Vec::new();
    collect(root, root, &mut entries);
    entries.sort();
    WorkspaceSnapshot {
        root: root.to_path_buf(),
        existed: root.is_dir(),
        entries,
        command: command.to_string(),
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(read) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in read.filter_map(|e| e.ok()) {
        let path = entry.path();
        if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().into_owned());
        }
        if path.is_dir() {
            collect(root, &path, out);
        }
    }
}

/// Backend that always fails after inspecting the workspace.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend {
    seen: Arc<Mutex<Option<WorkspaceSnapshot>>>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Option<WorkspaceSnapshot> {
        self.seen.lock().unwrap().clone()
    }
}

impl ExecutionBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn output_filter(&self) -> OutputFilter {
        OutputFilter::Sentinel
    }

    fn run<'a>(&'a mut self, workspace_root: &'a Path, command: &'a str) -> BoxFuture<'a, Result<Execution>> {
        Box::pin(async move {
            *self.seen.lock().unwrap() = Some(snapshot(workspace_root, command));
            Err(BenchError::Remote {
                message: "injected backend failure".to_string(),
                recovery: None,
            })
        })
    }
}

/// Backend that replays a fixed raw output.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    raw_output: Vec<u8>,
    filter: OutputFilter,
    remote_cleanup: RemoteCleanup,
    seen: Arc<Mutex<Option<WorkspaceSnapshot>>>,
}

impl StaticBackend {
    pub fn new(filter: OutputFilter, raw_output: &str) -> Self {
        Self {
            raw_output: raw_output.as_bytes().to_vec(),
            filter,
            remote_cleanup: RemoteCleanup::NotApplicable,
            seen: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_remote_cleanup(mut self, cleanup: RemoteCleanup) -> Self {
        self.remote_cleanup = cleanup;
        self
    }

    pub fn seen(&self) -> Option<WorkspaceSnapshot> {
        self.seen.lock().unwrap().clone()
    }
}

impl ExecutionBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn output_filter(&self) -> OutputFilter {
        self.filter
    }

    fn run<'a>(&'a mut self, workspace_root: &'a Path, command: &'a str) -> BoxFuture<'a, Result<Execution>> {
        Box::pin(async move {
            *self.seen.lock().unwrap() = Some(snapshot(workspace_root, command));
            Ok(Execution {
                raw_output: self.raw_output.clone(),
                remote_cleanup: self.remote_cleanup.clone(),
            })
        })
    }
}
