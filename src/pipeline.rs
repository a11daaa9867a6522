// src/pipeline.rs

//! The run orchestrator.
//!
//! resolve → create workspace → stage → rewrite → backend → filter →
//! teardown. The workspace is removed on every path once it exists,
//! including when staging or the backend fails.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::command::{BinaryLocator, DependencyResolver, Resolution};
use crate::errors::{BenchError, Result};
use crate::exec::ExecutionBackend;
use crate::fs::path_utils::absolutize;
use crate::fs::FileSystem;
use crate::progress::Progress;
use crate::rewrite::Rewriter;
use crate::stage::{Stager, Workspace};
use crate::teardown::{remove_workspace, WorkspaceCleanup};
use crate::types::RemoteCleanup;

/// What to benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub command: String,
    /// Folder to copy as a whole, as supplied by the user.
    pub folder: Option<PathBuf>,
}

/// Result of a successful backend run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkOutput {
    /// Command as issued on the remote side.
    pub rewritten_command: String,
    pub raw_output: Vec<u8>,
    pub filtered_output: Vec<u8>,
    pub remote_cleanup: RemoteCleanup,
}

/// Everything a run produced, including cleanup reports.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: Result<BenchmarkOutput>,
    /// `None` if the run failed before the workspace was created.
    pub workspace_root: Option<PathBuf>,
    pub workspace_cleanup: Option<WorkspaceCleanup>,
}

impl RunOutcome {
    fn early(err: BenchError) -> Self {
        Self {
            result: Err(err),
            workspace_root: None,
            workspace_cleanup: None,
        }
    }

    /// Process exit code; cleanup problems never affect it.
    pub fn exit_code(&self) -> i32 {
        if self.result.is_ok() { 0 } else { 1 }
    }
}

pub struct Pipeline<'a> {
    fs: &'a dyn FileSystem,
    locator: &'a dyn BinaryLocator,
    progress: &'a Progress,
    workspace_parent: Option<PathBuf>,
}

impl<'a> Pipeline<'a> {
    pub fn new(fs: &'a dyn FileSystem, locator: &'a dyn BinaryLocator, progress: &'a Progress) -> Self {
        Self {
            fs,
            locator,
            progress,
            workspace_parent: None,
        }
    }

    /// Create workspaces under `dir` instead of the current directory.
    pub fn with_workspace_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(dir.into());
        self
    }

    /// Parse the command and find its local dependencies.
    pub fn resolve(&self, command: &str) -> Result<Resolution> {
        let resolution = DependencyResolver::new(self.fs, self.locator).resolve(command)?;
        if resolution.command.is_empty() {
            return Err(BenchError::InvalidInput("command is empty".to_string()));
        }
        Ok(resolution)
    }

    /// Absolute location of the requested folder; it must be a directory.
    pub fn check_folder(&self, base_dir: &Path, folder: &Path) -> Result<PathBuf> {
        let absolute = absolutize(base_dir, folder);
        if !self.fs.exists(&absolute) {
            return Err(BenchError::InvalidInput(format!(
                "failed to access folder {}",
                absolute.display()
            )));
        }
        if !self.fs.is_dir(&absolute) {
            return Err(BenchError::InvalidInput(format!(
                "{} is not a directory",
                absolute.display()
            )));
        }
        Ok(absolute)
    }

    pub async fn execute(&self, request: &RunRequest, backend: &mut dyn ExecutionBackend) -> RunOutcome {
        // Everything up to workspace creation has no side effects.
        let resolution = match self.resolve(&request.command) {
            Ok(r) => r,
            Err(e) => return RunOutcome::early(e),
        };
        let folder = match &request.folder {
            Some(f) => match self.check_folder(&resolution.base_dir, f) {
                Ok(abs) => Some((f.clone(), abs)),
                Err(e) => return RunOutcome::early(e),
            },
            None => None,
        };
        if let Err(e) = backend.preflight() {
            return RunOutcome::early(e);
        }

        let parent = self
            .workspace_parent
            .clone()
            .unwrap_or_else(|| resolution.base_dir.clone());
        let workspace = match Workspace::create_in(&parent) {
            Ok(ws) => ws,
            Err(e) => {
                return RunOutcome::early(BenchError::Workspace(format!(
                    "failed to create temporary folder in {}: {e}",
                    parent.display()
                )));
            }
        };
        let root = workspace.root().to_path_buf();

        let result = self
            .stage_and_run(&resolution, folder.as_ref(), &root, backend)
            .await;

        let cleanup = remove_workspace(workspace);
        RunOutcome {
            result,
            workspace_root: Some(root),
            workspace_cleanup: Some(cleanup),
        }
    }

    async fn stage_and_run(
        &self,
        resolution: &Resolution,
        folder: Option<&(PathBuf, PathBuf)>,
        root: &Path,
        backend: &mut dyn ExecutionBackend,
    ) -> Result<BenchmarkOutput> {
        let staged = Stager::new(self.fs, self.progress).stage(
            root,
            &resolution.dependencies,
            folder.map(|(supplied, abs)| (supplied.as_path(), abs.as_path())),
        )?;
        debug!(entries = staged.remap.len(), "workspace staged");

        let rewritten = Rewriter::new(&staged.remap, staged.folder.as_ref(), &resolution.base_dir)
            .rewrite_command(&resolution.command);
        debug!(command = %rewritten, "adjusted command for remote environment");

        info!(backend = backend.name(), "dispatching benchmark");
        let execution = backend.run(root, &rewritten).await?;
        let filtered_output = backend.output_filter().apply(&execution.raw_output);

        Ok(BenchmarkOutput {
            rewritten_command: rewritten,
            raw_output: execution.raw_output,
            filtered_output,
            remote_cleanup: execution.remote_cleanup,
        })
    }
}
