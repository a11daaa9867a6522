// src/exec/provisioner.rs

//! Provisioning-engine seam used by the provisioned-instance backend.
//!
//! [`TerraformCli`] drives a pinned `terraform` binary against a template
//! directory. The engine is treated as an opaque collaborator: init, apply
//! and destroy, each returning the engine's combined output.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::exec::process::{run_captured, ProcessOutput};
use crate::exec::BoxFuture;

/// Variables handed to the instance template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionVars {
    /// Local workspace uploaded to the instance.
    pub benchmark_folder: String,
    pub instance_type: String,
    /// Command line the instance runs once it is up.
    pub custom_command: String,
}

impl ProvisionVars {
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("benchmark_folder", self.benchmark_folder.as_str()),
            ("instance_type", self.instance_type.as_str()),
            ("custom_command", self.custom_command.as_str()),
        ]
    }
}

/// Option set used for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Upgrade providers and force-copy state.
    Full,
    /// Upgrade providers only; used for the single retry.
    Reduced,
}

pub trait Provisioner: Send + Sync {
    /// Directory holding the instance template.
    fn template_dir(&self) -> &Path;

    /// Make the pinned engine version available, installing it if needed.
    fn ensure_installed(&mut self) -> BoxFuture<'_, Result<()>>;

    fn init(&self, mode: InitMode) -> BoxFuture<'_, Result<()>>;

    /// Create the instance. A non-zero exit is reported through
    /// [`ProcessOutput::success`], not as `Err`.
    fn apply<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, Result<ProcessOutput>>;

    fn destroy<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, Result<ProcessOutput>>;

    /// Shell command the user can run to finish a teardown by hand.
    fn manual_destroy_command(&self) -> String {
        format!("cd {} && terraform destroy", self.template_dir().display())
    }

    /// Shell command the user can run to initialise the template by hand.
    fn manual_init_command(&self) -> String {
        format!("cd {} && terraform init -upgrade", self.template_dir().display())
    }
}

/// `terraform` CLI pinned to an exact version.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    template_dir: PathBuf,
    version: String,
    exec_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct VersionReport {
    terraform_version: String,
}

impl TerraformCli {
    pub fn new(template_dir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            template_dir: template_dir.into(),
            version: version.into(),
            exec_path: None,
        }
    }

    /// Where a downloaded copy of this version is kept.
    pub fn install_dir(&self) -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("benchrunner")
            .join("terraform")
            .join(&self.version)
    }

    /// Release archive URL for the current platform.
    pub fn download_url(&self) -> Result<String> {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            "linux" => "linux",
            "windows" => "windows",
            "freebsd" => "freebsd",
            other => bail!("no terraform release for OS {other}"),
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "arm",
            other => bail!("no terraform release for architecture {other}"),
        };
        let v = &self.version;
        Ok(format!(
            "https://releases.hashicorp.com/terraform/{v}/terraform_{v}_{os}_{arch}.zip"
        ))
    }

    fn binary_name() -> &'static str {
        if cfg!(windows) { "terraform.exe" } else { "terraform" }
    }

    async fn installed_version(path: &Path) -> Option<String> {
        let mut cmd = Command::new(path);
        cmd.args(["version", "-json"]);
        let out = run_captured(cmd, "terraform version").await.ok()?;
        if !out.success {
            return None;
        }
        serde_json::from_slice::<VersionReport>(&out.output)
            .ok()
            .map(|r| r.terraform_version)
    }

    async fn download(&self, install_dir: &Path) -> Result<PathBuf> {
        let url = self.download_url()?;
        tokio::fs::create_dir_all(install_dir)
            .await
            .with_context(|| format!("creating dir {:?}", install_dir))?;

        info!(url = %url, "downloading terraform");
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .context("building HTTP client")?;
        let archive = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("downloading {url}"))?
            .bytes()
            .await
            .with_context(|| format!("reading {url}"))?;
        debug!(bytes = archive.len(), "terraform archive downloaded");

        let dest = install_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract_zip(Cursor::new(archive), &dest))
            .await
            .context("unpacking task did not finish")?
            .with_context(|| format!("unpacking {url}"))?;

        let binary = install_dir.join(Self::binary_name());
        if !binary.is_file() {
            bail!("archive from {url} did not contain {}", Self::binary_name());
        }
        Ok(binary)
    }

    fn command(&self) -> Result<Command> {
        let path = self
            .exec_path
            .as_ref()
            .ok_or_else(|| anyhow!("terraform is not installed yet"))?;
        let mut cmd = Command::new(path);
        cmd.current_dir(&self.template_dir)
            .env("TF_IN_AUTOMATION", "1")
            .stdin(std::process::Stdio::null());
        Ok(cmd)
    }

    fn with_vars(cmd: &mut Command, vars: &ProvisionVars) {
        for (name, value) in vars.pairs() {
            cmd.arg("-var").arg(format!("{name}={value}"));
        }
    }
}

impl Provisioner for TerraformCli {
    fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    fn ensure_installed(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let install_dir = self.install_dir();
            let cached = install_dir.join(Self::binary_name());
            if cached.is_file() {
                debug!(path = %cached.display(), "using cached terraform");
                self.exec_path = Some(cached);
                return Ok(());
            }

            if let Ok(found) = which::which("terraform") {
                match Self::installed_version(&found).await {
                    Some(v) if v == self.version => {
                        debug!(path = %found.display(), version = %v, "using terraform from PATH");
                        self.exec_path = Some(found);
                        return Ok(());
                    }
                    other => debug!(
                        path = %found.display(),
                        found = ?other,
                        wanted = %self.version,
                        "terraform on PATH has a different version"
                    ),
                }
            }

            let binary = self.download(&install_dir).await?;
            info!(path = %binary.display(), version = %self.version, "installed terraform");
            self.exec_path = Some(binary);
            Ok(())
        })
    }

    fn init(&self, mode: InitMode) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut cmd = self.command()?;
            cmd.args(["init", "-input=false", "-upgrade"]);
            if mode == InitMode::Full {
                cmd.arg("-force-copy");
            }
            debug!(dir = %self.template_dir.display(), ?mode, "terraform init");
            let out = run_captured(cmd, "terraform init").await?;
            if !out.success {
                bail!(
                    "terraform init exited with code {}: {}",
                    out.code(),
                    out.text().trim()
                );
            }
            Ok(())
        })
    }

    fn apply<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, Result<ProcessOutput>> {
        Box::pin(async move {
            let mut cmd = self.command()?;
            cmd.args(["apply", "-auto-approve", "-input=false"]);
            Self::with_vars(&mut cmd, vars);
            run_captured(cmd, "terraform apply").await
        })
    }

    fn destroy<'a>(&'a self, vars: &'a ProvisionVars) -> BoxFuture<'a, Result<ProcessOutput>> {
        Box::pin(async move {
            let mut cmd = self.command()?;
            cmd.args(["destroy", "-auto-approve", "-input=false"]);
            Self::with_vars(&mut cmd, vars);
            run_captured(cmd, "terraform destroy").await
        })
    }
}

/// Unpack a zip archive into `dest`, keeping unix modes.
///
/// Entries whose names would land outside `dest` are skipped.
pub fn extract_zip<R: Read + Seek>(data: R, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(data).context("reading zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let rel = match file.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                warn!(entry = %file.name(), "skipping archive entry outside the install dir");
                continue;
            }
        };
        let outpath = dest.join(&rel);

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("creating dir {:?}", outpath))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut outfile =
            File::create(&outpath).with_context(|| format!("creating {:?}", outpath))?;
        std::io::copy(&mut file, &mut outfile)
            .with_context(|| format!("writing {:?}", outpath))?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("setting mode on {:?}", outpath))?;
        }
    }

    Ok(())
}
