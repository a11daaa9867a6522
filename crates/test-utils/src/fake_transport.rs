use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use benchrunner::exec::{BoxFuture, ProcessOutput, RemoteTransport, SshTarget};

/// One call seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Mkdir { remote_dir: String },
    /// `entries` are the file names present in the local dir at copy time.
    Copy { remote_dir: String, entries: Vec<String> },
    /// `remote_script` is the path the host is asked to run.
    RunScript { remote_script: String },
}

/// A transport that:
/// - records every call (shared between clones)
/// - never touches the network
/// - fails at a chosen step when asked to.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    fail_mkdir: bool,
    fail_copy: bool,
    fail_run: bool,
    run_output: ProcessOutput,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            run_output: ProcessOutput {
                output: Vec::new(),
                exit_code: Some(0),
                success: true,
            },
            ..Self::default()
        }
    }

    /// What `run_script` returns.
    pub fn with_run_output(mut self, output: ProcessOutput) -> Self {
        self.run_output = output;
        self
    }

    pub fn failing_mkdir(mut self) -> Self {
        self.fail_mkdir = true;
        self
    }

    pub fn failing_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RemoteTransport for FakeTransport {
    fn mkdir<'a>(&'a self, _target: &'a SshTarget, remote_dir: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.record(TransportCall::Mkdir {
                remote_dir: remote_dir.to_string(),
            });
            if self.fail_mkdir {
                return Err(anyhow!("connection refused"));
            }
            Ok(())
        })
    }

    fn copy_recursive<'a>(
        &'a self,
        _target: &'a SshTarget,
        local_dir: &'a Path,
        remote_dir: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let mut entries: Vec<String> = std::fs::read_dir(local_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            entries.sort();
            self.record(TransportCall::Copy {
                remote_dir: remote_dir.to_string(),
                entries,
            });
            if self.fail_copy {
                return Err(anyhow!("lost connection"));
            }
            Ok(())
        })
    }

    fn run_script<'a>(
        &'a self,
        _target: &'a SshTarget,
        remote_script: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<ProcessOutput>> {
        Box::pin(async move {
            self.record(TransportCall::RunScript {
                remote_script: remote_script.to_string(),
            });
            if self.fail_run {
                return Err(anyhow!("ssh: broken pipe"));
            }
            Ok(self.run_output.clone())
        })
    }
}
