// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;
pub mod path_utils;

/// Abstract filesystem interface used by dependency resolution and staging.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Directory relative paths are resolved against.
    fn current_dir(&self) -> Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a regular file, carrying its permission bits over.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Apply the permission bits of `src` to `dst`.
    fn copy_permissions(&self, src: &Path, dst: &Path) -> Result<()>;

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// Implementation that uses `std::fs`.
///
/// Relative tokens resolve against the process working directory unless a
/// different one is pinned with [`RealFileSystem::with_current_dir`].
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem {
    current_dir: Option<PathBuf>,
}

impl RealFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: Some(dir.into()),
        }
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        match &self.current_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("reading current directory"),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        // `fs::copy` also copies the permission bits.
        fs::copy(src, dst).with_context(|| format!("copying {:?} to {:?}", src, dst))?;
        Ok(())
    }

    fn copy_permissions(&self, src: &Path, dst: &Path) -> Result<()> {
        let perms = fs::metadata(src)
            .with_context(|| format!("reading metadata of {:?}", src))?
            .permissions();
        fs::set_permissions(dst, perms).with_context(|| format!("setting permissions on {:?}", dst))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::write(path, contents).with_context(|| format!("writing to file {:?}", path))
    }
}
