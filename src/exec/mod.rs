// src/exec/mod.rs

//! Execution layer.
//!
//! This module is responsible for actually running the staged command on a
//! remote machine, using `tokio::process::Command` to drive external tools.
//!
//! - [`backend`] provides the `ExecutionBackend` trait the orchestrator uses.
//! - [`existing_host`] runs on a reachable host via a [`transport`].
//! - [`provisioned`] creates and destroys an instance via a [`provisioner`].
//! - [`script`] generates the shell text that runs the command three times.
//! - [`process`] spawns a child and captures its combined output.

use std::future::Future;
use std::pin::Pin;

pub mod backend;
pub mod existing_host;
pub mod process;
pub mod provisioned;
pub mod provisioner;
pub mod script;
pub mod transport;

/// Boxed, sendable future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use backend::{Execution, ExecutionBackend};
pub use existing_host::ExistingHostBackend;
pub use process::ProcessOutput;
pub use provisioned::ProvisionedBackend;
pub use provisioner::{InitMode, ProvisionVars, Provisioner, TerraformCli};
pub use transport::{RemoteTransport, SshTarget, SshTransport};
