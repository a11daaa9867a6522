use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use benchrunner::exec::{BoxFuture, InitMode, ProcessOutput, ProvisionVars, Provisioner};

/// One call seen by [`FakeProvisioner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionCall {
    Install,
    Init(InitMode),
    Apply(ProvisionVars),
    Destroy(ProvisionVars),
}

/// A provisioning engine that records calls and replays canned results.
///
/// Defaults: install/init succeed, apply exits 0 with no output, destroy
/// succeeds immediately.
#[derive(Debug, Clone)]
pub struct FakeProvisioner {
    template_dir: PathBuf,
    calls: Arc<Mutex<Vec<ProvisionCall>>>,
    fail_install: bool,
    /// How many `init` calls fail before one succeeds.
    init_failures: Arc<Mutex<usize>>,
    apply_output: ProcessOutput,
    apply_error: Option<String>,
    destroy_delay: Option<Duration>,
    destroy_exit_code: i32,
}

impl FakeProvisioner {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_install: false,
            init_failures: Arc::new(Mutex::new(0)),
            apply_output: exit_output(0, ""),
            apply_error: None,
            destroy_delay: None,
            destroy_exit_code: 0,
        }
    }

    pub fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }

    pub fn failing_init(self, times: usize) -> Self {
        *self.init_failures.lock().unwrap() = times;
        self
    }

    pub fn with_apply_output(mut self, exit_code: i32, text: &str) -> Self {
        self.apply_output = exit_output(exit_code, text);
        self
    }

    /// Make `apply` fail to run at all.
    pub fn with_apply_error(mut self, message: &str) -> Self {
        self.apply_error = Some(message.to_string());
        self
    }

    /// Make `destroy` take `delay` before returning.
    pub fn with_destroy_delay(mut self, delay: Duration) -> Self {
        self.destroy_delay = Some(delay);
        self
    }

    pub fn with_destroy_exit_code(mut self, code: i32) -> Self {
        self.destroy_exit_code = code;
        self
    }

    pub fn calls(&self) -> Vec<ProvisionCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ProvisionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A finished-process result with the given exit code and text.
pub fn exit_output(exit_code: i32, text: &str) -> ProcessOutput {
    ProcessOutput {
        output: text.as_bytes().to_vec(),
        exit_code: Some(exit_code),
        success: exit_code == 0,
    }
}

impl Provisioner for FakeProvisioner {
    fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    fn ensure_installed(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.record(ProvisionCall::Install);
            if self.fail_install {
                return Err(anyhow!("download failed"));
            }
            Ok(())
        })
    }

    fn init(&self, mode: InitMode) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.record(ProvisionCall::Init(mode));
            let mut remaining = self.init_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(anyhow!("backend configuration changed"));
            }
            Ok(())
        })
    }

    fn apply<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, anyhow::Result<ProcessOutput>> {
        Box::pin(async move {
            self.record(ProvisionCall::Apply(vars.clone()));
            match &self.apply_error {
                Some(message) => Err(anyhow!("{message}")),
                None => Ok(self.apply_output.clone()),
            }
        })
    }

    fn destroy<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, anyhow::Result<ProcessOutput>> {
        Box::pin(async move {
            self.record(ProvisionCall::Destroy(vars.clone()));
            if let Some(delay) = self.destroy_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(exit_output(self.destroy_exit_code, ""))
        })
    }
}
