// src/exec/transport.rs

//! Remote shell / remote copy seam used by the existing-host backend.
//!
//! [`SshTransport`] shells out to the system `ssh` and `scp`. Tests provide
//! their own [`RemoteTransport`] that records calls instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::exec::process::{run_captured, ProcessOutput};
use crate::exec::script::shell_quote;
use crate::exec::BoxFuture;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub key: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl SshTarget {
    /// `user@host`.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Absolute remote directory for `dir`; relative values live in the
    /// user's home.
    pub fn remote_path(&self, dir: &str) -> String {
        if dir.starts_with('/') {
            dir.to_string()
        } else {
            format!("/home/{}/{}", self.user, dir)
        }
    }
}

pub trait RemoteTransport: Send + Sync {
    /// Create `remote_dir` (and parents) on the host.
    fn mkdir<'a>(&'a self, target: &'a SshTarget, remote_dir: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Copy the contents of `local_dir` into `remote_dir`.
    fn copy_recursive<'a>(
        &'a self,
        target: &'a SshTarget,
        local_dir: &'a Path,
        remote_dir: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Execute an already uploaded script with `bash` on the host.
    ///
    /// The remote side gets no stdin, so a benchmarked command that reads
    /// it sees end of file.
    fn run_script<'a>(
        &'a self,
        target: &'a SshTarget,
        remote_script: &'a str,
    ) -> BoxFuture<'a, Result<ProcessOutput>>;
}

/// Transport backed by the OpenSSH client tools.
#[derive(Debug, Clone, Default)]
pub struct SshTransport;

impl SshTransport {
    fn common_opts(target: &SshTarget) -> Vec<String> {
        let mut opts: Vec<String> = vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", target.connect_timeout.as_secs().max(1)),
            "-o".into(),
            "LogLevel=ERROR".into(),
        ];
        if let Some(key) = &target.key {
            opts.push("-i".into());
            opts.push(key.to_string_lossy().into_owned());
        }
        opts
    }
}

impl RemoteTransport for SshTransport {
    fn mkdir<'a>(&'a self, target: &'a SshTarget, remote_dir: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut cmd = Command::new("ssh");
            cmd.args(Self::common_opts(target))
                .arg(target.destination())
                .arg(format!("mkdir -p {}", shell_quote(remote_dir)))
                .stdin(std::process::Stdio::null());

            let out = run_captured(cmd, "ssh mkdir").await?;
            if !out.success {
                bail!(
                    "ssh mkdir on {} exited with code {}: {}",
                    target.host,
                    out.code(),
                    out.text().trim()
                );
            }
            Ok(())
        })
    }

    fn copy_recursive<'a>(
        &'a self,
        target: &'a SshTarget,
        local_dir: &'a Path,
        remote_dir: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(local_dir)
                .await
                .with_context(|| format!("reading dir {:?}", local_dir))?;
            while let Some(entry) = dir.next_entry().await? {
                entries.push(entry.path());
            }
            entries.sort();

            if entries.is_empty() {
                debug!(dir = %local_dir.display(), "workspace is empty; nothing to copy");
                return Ok(());
            }

            let mut cmd = Command::new("scp");
            cmd.args(Self::common_opts(target))
                .arg("-r")
                .args(&entries)
                .arg(format!("{}:{}/", target.destination(), remote_dir))
                .stdin(std::process::Stdio::null());

            let out = run_captured(cmd, "scp").await?;
            if !out.success {
                bail!(
                    "scp to {} exited with code {}: {}",
                    target.host,
                    out.code(),
                    out.text().trim()
                );
            }
            Ok(())
        })
    }

    fn run_script<'a>(
        &'a self,
        target: &'a SshTarget,
        remote_script: &'a str,
    ) -> BoxFuture<'a, Result<ProcessOutput>> {
        Box::pin(async move {
            let mut cmd = Command::new("ssh");
            cmd.args(Self::common_opts(target))
                .arg("-n")
                .arg(target.destination())
                .arg(format!("bash {}", shell_quote(remote_script)))
                .stdin(std::process::Stdio::null());

            run_captured(cmd, "ssh benchmark").await
        })
    }
}
