#![allow(dead_code)]

use std::path::{Path, PathBuf};

use benchrunner::config::{ConfigFile, ProvisionSection, RawConfigFile, RemoteSection};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                remote: RemoteSection::default(),
                provision: ProvisionSection::default(),
            },
        }
    }

    pub fn ssh_user(mut self, user: &str) -> Self {
        self.config.remote.ssh_user = user.to_string();
        self
    }

    pub fn remote_dir(mut self, dir: &str) -> Self {
        self.config.remote.remote_dir = dir.to_string();
        self
    }

    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.provision.template_dir = dir.into();
        self
    }

    pub fn engine_version(mut self, version: &str) -> Self {
        self.config.provision.engine_version = version.to_string();
        self
    }

    pub fn instance_type(mut self, ty: &str) -> Self {
        self.config.provision.instance_type = ty.to_string();
        self
    }

    pub fn destroy_timeout_secs(mut self, secs: u64) -> Self {
        self.config.provision.destroy_timeout_secs = secs;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Invalid config")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scratch directory tree on the real filesystem.
pub struct TreeBuilder {
    dir: TempDir,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Canonical root, so it compares equal to paths derived from it.
    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().expect("canonicalize temp dir")
    }

    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root().join(rel)
    }

    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    #[cfg(unix)]
    pub fn executable(self, rel: &str, content: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;
        let tree = self.file(rel, content);
        let path = tree.path(rel);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");
        tree
    }

    pub fn dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.path(rel)).expect("create dir");
        self
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
