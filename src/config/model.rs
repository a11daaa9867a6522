// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [remote]
/// ssh_user = "ubuntu"
/// remote_dir = "benchmark"
///
/// [provision]
/// template_dir = "../aws"
/// engine_version = "1.7.5"
/// instance_type = "t2.micro"
/// destroy_timeout_secs = 180
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub provision: ProvisionSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or [`ConfigFile::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub remote: RemoteSection,
    pub provision: ProvisionSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(remote: RemoteSection, provision: ProvisionSection) -> Self {
        Self { remote, provision }
    }

    pub fn destroy_timeout(&self) -> Duration {
        Duration::from_secs(self.provision.destroy_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.connect_timeout_secs)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RemoteSection::default(), ProvisionSection::default())
    }
}

/// `[remote]` section: settings for the existing-host backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    /// User for `--host` when `--ssh-user` is not given.
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,

    /// Target directory on the host. Relative values are taken from the
    /// user's home (`/home/<user>/<remote_dir>`).
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_ssh_user() -> String {
    "ubuntu".to_string()
}

fn default_remote_dir() -> String {
    "benchmark".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            ssh_user: default_ssh_user(),
            remote_dir: default_remote_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// `[provision]` section: settings for the provisioned-instance backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionSection {
    /// Directory holding the declarative instance template.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Exact engine version to install and run.
    #[serde(default = "default_engine_version")]
    pub engine_version: String,

    #[serde(default = "default_instance_type")]
    pub instance_type: String,

    /// Upper bound for the destroy phase.
    #[serde(default = "default_destroy_timeout_secs")]
    pub destroy_timeout_secs: u64,
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("../aws")
}

fn default_engine_version() -> String {
    "1.7.5".to_string()
}

fn default_instance_type() -> String {
    "t2.micro".to_string()
}

fn default_destroy_timeout_secs() -> u64 {
    180
}

impl Default for ProvisionSection {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            engine_version: default_engine_version(),
            instance_type: default_instance_type(),
            destroy_timeout_secs: default_destroy_timeout_secs(),
        }
    }
}
