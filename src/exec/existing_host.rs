// src/exec/existing_host.rs

//! Run the benchmark on a machine that is already reachable over ssh.

use std::path::Path;

use tracing::{debug, error, info};

use crate::errors::{BenchError, Result};
use crate::exec::backend::{Execution, ExecutionBackend};
use crate::exec::script::{sentinel_script, shell_quote, SCRIPT_NAME};
use crate::exec::transport::{RemoteTransport, SshTarget};
use crate::exec::BoxFuture;
use crate::filter::OutputFilter;
use crate::progress::Progress;
use crate::types::RemoteCleanup;

pub struct ExistingHostBackend<T: RemoteTransport> {
    transport: T,
    target: SshTarget,
    /// Absolute directory on the host.
    remote_dir: String,
    progress: Progress,
}

impl<T: RemoteTransport> ExistingHostBackend<T> {
    /// `remote_dir` may be relative to the user's home on the host.
    pub fn new(transport: T, target: SshTarget, remote_dir: &str, progress: Progress) -> Self {
        let remote_dir = target.remote_path(remote_dir);
        Self {
            transport,
            target,
            remote_dir,
            progress,
        }
    }

    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Command that removes what this backend left on the host.
    pub fn manual_cleanup_command(&self) -> String {
        format!(
            "ssh {} rm -rf {}",
            self.target.destination(),
            shell_quote(&self.remote_dir)
        )
    }

    /// Location of the uploaded wrapper script on the host.
    pub fn remote_script(&self) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), SCRIPT_NAME)
    }

    fn remote_error(&self, message: String, leftovers: bool) -> BenchError {
        BenchError::Remote {
            message,
            recovery: leftovers.then(|| self.manual_cleanup_command()),
        }
    }
}

impl<T: RemoteTransport> ExecutionBackend for ExistingHostBackend<T> {
    fn name(&self) -> &'static str {
        "existing-host"
    }

    fn output_filter(&self) -> OutputFilter {
        OutputFilter::Sentinel
    }

    fn preflight(&self) -> Result<()> {
        if let Some(key) = &self.target.key {
            if !key.is_file() {
                return Err(BenchError::InvalidInput(format!(
                    "SSH key file not found: {}",
                    key.display()
                )));
            }
        }
        Ok(())
    }

    fn run<'a>(
        &'a mut self,
        workspace_root: &'a Path,
        command: &'a str,
    ) -> BoxFuture<'a, Result<Execution>> {
        Box::pin(async move {
            self.preflight()?;
            info!(host = %self.target.host, "running benchmark on existing machine");

            // Uploaded with the rest of the workspace.
            let script_path = workspace_root.join(SCRIPT_NAME);
            let script = sentinel_script(&self.remote_dir, command);
            debug!(path = %script_path.display(), "writing benchmark script");
            tokio::fs::write(&script_path, script).await.map_err(|e| {
                self.remote_error(format!("failed to create benchmark script: {e}"), false)
            })?;

            {
                let _spinner = self.progress.spinner("Preparing remote environment...");
                self.transport
                    .mkdir(&self.target, &self.remote_dir)
                    .await
                    .map_err(|e| {
                        self.remote_error(
                            format!("failed to create benchmark directory on remote machine: {e:#}"),
                            false,
                        )
                    })?;
            }

            {
                let _spinner = self.progress.spinner("Copying files to remote machine...");
                self.transport
                    .copy_recursive(&self.target, workspace_root, &self.remote_dir)
                    .await
                    .map_err(|e| {
                        self.remote_error(
                            format!("failed to copy files to remote machine: {e:#}"),
                            true,
                        )
                    })?;
            }

            let remote_script = self.remote_script();
            let output = {
                let _spinner = self.progress.spinner("Running benchmark...");
                self.transport
                    .run_script(&self.target, &remote_script)
                    .await
                    .map_err(|e| {
                        self.remote_error(format!("failed to run benchmark script: {e:#}"), true)
                    })?
            };

            if !output.success {
                error!(
                    host = %self.target.host,
                    exit_code = output.code(),
                    output = %output.text(),
                    "benchmark script failed on remote machine"
                );
                return Err(self.remote_error(
                    format!(
                        "benchmark script exited with code {} on {}",
                        output.code(),
                        self.target.host
                    ),
                    true,
                ));
            }

            info!(
                remote_dir = %self.remote_dir,
                "benchmark files are left on the host; remove them with: {}",
                self.manual_cleanup_command()
            );

            Ok(Execution {
                raw_output: output.output,
                remote_cleanup: RemoteCleanup::NotApplicable,
            })
        })
    }
}
