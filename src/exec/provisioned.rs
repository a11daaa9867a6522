// src/exec/provisioned.rs

//! Run the benchmark on a disposable instance created for this run.
//!
//! Sequence: install engine → init (one retry with fewer options) → apply →
//! destroy. Destroy is attempted whenever apply was attempted, and is bounded
//! by a deadline; its outcome never turns a successful benchmark into a
//! failure.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::errors::{BenchError, Result};
use crate::exec::backend::{Execution, ExecutionBackend};
use crate::exec::provisioner::{InitMode, ProvisionVars, Provisioner};
use crate::exec::script::tagged_command;
use crate::exec::BoxFuture;
use crate::filter::OutputFilter;
use crate::progress::Progress;
use crate::types::RemoteCleanup;

pub struct ProvisionedBackend<P: Provisioner> {
    provisioner: P,
    instance_type: String,
    destroy_timeout: Duration,
    progress: Progress,
}

impl<P: Provisioner> ProvisionedBackend<P> {
    pub fn new(
        provisioner: P,
        instance_type: impl Into<String>,
        destroy_timeout: Duration,
        progress: Progress,
    ) -> Self {
        Self {
            provisioner,
            instance_type: instance_type.into(),
            destroy_timeout,
            progress,
        }
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    async fn initialize(&mut self) -> Result<()> {
        {
            let _spinner = self.progress.spinner("Installing provisioning engine...");
            self.provisioner
                .ensure_installed()
                .await
                .map_err(|e| BenchError::Provisioning {
                    message: format!("failed to install provisioning engine: {e:#}"),
                    recovery: None,
                    cleanup: RemoteCleanup::NotApplicable,
                })?;
        }

        let first = {
            let _spinner = self.progress.spinner("Initializing provisioning engine...");
            self.provisioner.init(InitMode::Full).await
        };
        if let Err(err) = first {
            warn!(error = %format!("{err:#}"), "init failed; retrying with reduced options");
            let _spinner = self.progress.spinner("Reinitializing provisioning engine...");
            self.provisioner
                .init(InitMode::Reduced)
                .await
                .map_err(|e| BenchError::Provisioning {
                    message: format!("failed to initialize provisioning engine: {e:#}"),
                    recovery: Some(self.provisioner.manual_init_command()),
                    cleanup: RemoteCleanup::NotApplicable,
                })?;
        }
        info!(dir = %self.provisioner.template_dir().display(), "provisioning engine initialized");
        Ok(())
    }

    /// Destroy under the deadline and classify the outcome.
    async fn destroy(&self, vars: &ProvisionVars) -> RemoteCleanup {
        info!(timeout_secs = self.destroy_timeout.as_secs(), "destroying provisioned machine");
        let recovery = self.provisioner.manual_destroy_command();
        let _spinner = self.progress.spinner(format!(
            "Destroying provisioned machine (timeout: {}s)...",
            self.destroy_timeout.as_secs()
        ));

        match tokio::time::timeout(self.destroy_timeout, self.provisioner.destroy(vars)).await {
            Err(_elapsed) => {
                error!(
                    timeout_secs = self.destroy_timeout.as_secs(),
                    "destroy timed out; resources may still exist"
                );
                RemoteCleanup::TimedOut {
                    after: self.destroy_timeout,
                    recovery,
                }
            }
            Ok(Err(err)) => {
                error!(error = %format!("{err:#}"), "destroy failed to run");
                RemoteCleanup::Failed {
                    error: format!("{err:#}"),
                    recovery,
                }
            }
            Ok(Ok(out)) if !out.success => {
                error!(exit_code = out.code(), "destroy exited with an error");
                debug!(output = %out.text(), "destroy output");
                RemoteCleanup::Failed {
                    error: format!("destroy exited with code {}", out.code()),
                    recovery,
                }
            }
            Ok(Ok(_)) => {
                info!("provisioned resources destroyed");
                RemoteCleanup::Destroyed
            }
        }
    }
}

impl<P: Provisioner> ExecutionBackend for ProvisionedBackend<P> {
    fn name(&self) -> &'static str {
        "provisioned-instance"
    }

    fn output_filter(&self) -> OutputFilter {
        OutputFilter::TagOnly
    }

    fn preflight(&self) -> Result<()> {
        let dir = self.provisioner.template_dir();
        if !dir.is_dir() {
            return Err(BenchError::InvalidInput(format!(
                "instance template directory not found: {}",
                dir.display()
            )));
        }
        Ok(())
    }

    fn run<'a>(
        &'a mut self,
        workspace_root: &'a Path,
        command: &'a str,
    ) -> BoxFuture<'a, Result<Execution>> {
        Box::pin(async move {
            self.initialize().await?;

            let vars = ProvisionVars {
                benchmark_folder: workspace_root.to_string_lossy().into_owned(),
                instance_type: self.instance_type.clone(),
                custom_command: tagged_command(command),
            };
            debug!(custom_command = %vars.custom_command, "apply variables prepared");

            let applied = {
                let _spinner = self.progress.spinner("Provisioning machine...");
                self.provisioner.apply(&vars).await
            };

            // Resources may exist even if apply failed.
            let cleanup = self.destroy(&vars).await;

            match applied {
                Ok(out) if out.success => {
                    info!("machine provisioned and benchmark finished");
                    Ok(Execution {
                        raw_output: out.output,
                        remote_cleanup: cleanup,
                    })
                }
                Ok(out) => {
                    debug!(output = %out.text(), "apply output");
                    Err(BenchError::Provisioning {
                        message: format!("apply exited with code {}", out.code()),
                        recovery: cleanup.recovery().map(str::to_string),
                        cleanup,
                    })
                }
                Err(err) => Err(BenchError::Provisioning {
                    message: format!("apply failed to run: {err:#}"),
                    recovery: cleanup.recovery().map(str::to_string),
                    cleanup,
                }),
            }
        })
    }
}
