// src/exec/backend.rs

//! Pluggable execution backend abstraction.
//!
//! The orchestrator talks to an `ExecutionBackend` instead of a concrete
//! transport. There are exactly two production implementations, chosen once
//! per run:
//!
//! - [`ExistingHostBackend`](super::ExistingHostBackend) when a host address
//!   was given;
//! - [`ProvisionedBackend`](super::ProvisionedBackend) otherwise.
//!
//! Tests can provide their own implementation that doesn't touch the network.

use std::path::Path;

use crate::errors::Result;
use crate::exec::BoxFuture;
use crate::filter::OutputFilter;
use crate::types::RemoteCleanup;

/// What a backend hands back after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Everything captured from the transport, noise included.
    pub raw_output: Vec<u8>,
    /// State of remote compute created for this run.
    pub remote_cleanup: RemoteCleanup,
}

/// Trait abstracting where the staged command runs.
pub trait ExecutionBackend: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Filter that extracts benchmark lines from this backend's raw output.
    fn output_filter(&self) -> OutputFilter;

    /// Checks that must pass before any local or remote side effect.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }

    /// Run `command` three times inside the staged workspace.
    ///
    /// The workspace is only read (or uploaded); it stays owned by the caller.
    fn run<'a>(
        &'a mut self,
        workspace_root: &'a Path,
        command: &'a str,
    ) -> BoxFuture<'a, Result<Execution>>;
}
