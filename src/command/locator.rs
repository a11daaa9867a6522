// src/command/locator.rs

use std::fmt::Debug;
use std::path::PathBuf;

/// Search-path lookup for executables.
pub trait BinaryLocator: Send + Sync + Debug {
    /// Absolute location of `name`, or `None` if it can't be found.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Looks binaries up on `PATH` via the `which` crate.
#[derive(Debug, Clone, Default)]
pub struct PathLocator;

impl BinaryLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}
