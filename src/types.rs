// src/types.rs

use std::fmt;
use std::time::Duration;

/// How a dependency was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// First token of a sub-command, found on the search path.
    Binary,
    /// Non-flag argument naming an existing regular file.
    File,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Binary => f.write_str("binary"),
            DependencyKind::File => f.write_str("file"),
        }
    }
}

/// What happened to remote compute after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCleanup {
    /// Nothing remote was created by this run.
    NotApplicable,
    /// Provisioned resources were destroyed.
    Destroyed,
    /// The destroy call returned an error.
    Failed { error: String, recovery: String },
    /// The destroy call was abandoned at the deadline; remote state unknown.
    TimedOut { after: Duration, recovery: String },
}

impl RemoteCleanup {
    /// Manual command the user has to run, if cleanup did not complete.
    pub fn recovery(&self) -> Option<&str> {
        match self {
            RemoteCleanup::Failed { recovery, .. } | RemoteCleanup::TimedOut { recovery, .. } => {
                Some(recovery)
            }
            _ => None,
        }
    }
}
