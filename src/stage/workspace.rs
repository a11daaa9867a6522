// src/stage/workspace.rs

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = ".ib-";

/// Exclusively-owned temporary directory holding everything a run needs.
///
/// Created fresh for every run. The directory is removed by
/// [`Workspace::remove`]; if the value is dropped instead (panic, early
/// return) the underlying `TempDir` still deletes it.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl Workspace {
    /// Create a uniquely-named workspace inside `parent`.
    pub fn create_in(parent: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        let root = dir.path().to_path_buf();
        debug!(root = %root.display(), "created workspace");
        Ok(Self {
            dir: Some(dir),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the workspace, reporting any error.
    pub fn remove(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}
