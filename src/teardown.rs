// src/teardown.rs

//! Cleanup that runs after every run, whatever its outcome.
//!
//! Cleanup results are reported next to the run result and never replace
//! it: a benchmark that succeeded stays successful even if the workspace
//! could not be removed or the instance could not be destroyed.

use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::stage::Workspace;
use crate::types::RemoteCleanup;

/// Outcome of removing the local workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCleanup {
    Removed,
    Failed { path: PathBuf, error: String },
}

/// Remove the local workspace, reporting (not propagating) failures.
pub fn remove_workspace(workspace: Workspace) -> WorkspaceCleanup {
    let path = workspace.root().to_path_buf();
    debug!(path = %path.display(), "cleaning up workspace");
    match workspace.remove() {
        Ok(()) => WorkspaceCleanup::Removed,
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to remove the workspace");
            WorkspaceCleanup::Failed {
                path,
                error: err.to_string(),
            }
        }
    }
}

/// Log what the user still has to clean up by hand.
pub fn report_remote_cleanup(cleanup: &RemoteCleanup) {
    match cleanup {
        RemoteCleanup::NotApplicable | RemoteCleanup::Destroyed => {}
        RemoteCleanup::Failed { error, recovery } => {
            warn!(
                error = %error,
                "an error occurred while destroying resources; they might still exist! Ensure to run: {recovery}"
            );
        }
        RemoteCleanup::TimedOut { after, recovery } => {
            warn!(
                timeout_secs = after.as_secs(),
                "destroy timed out; resources might still exist! Manually destroy with: {recovery}"
            );
        }
    }
}
