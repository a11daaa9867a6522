// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
}

/// In-memory filesystem rooted at an absolute working directory.
///
/// Paths are stored exactly as given; tests are expected to use absolute
/// paths (or paths relative to nothing, which never match).
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    cwd: PathBuf,
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    failing_copies: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let fs = Self {
            cwd: cwd.clone(),
            entries: Arc::new(Mutex::new(HashMap::new())),
            failing_copies: Arc::new(Mutex::new(BTreeSet::new())),
        };
        fs.add_dir(&cwd);
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_with_mode(path, content, 0o644);
    }

    pub fn add_file_with_mode(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, mode: u32) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                content: content.into(),
                mode,
            },
        );
    }

    /// Create a directory and all its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir { mode: 0o755 });
        }
    }

    /// Make every later `copy_file` from `src` fail.
    pub fn fail_copies_from(&self, src: impl AsRef<Path>) {
        self.failing_copies
            .lock()
            .unwrap()
            .insert(src.as_ref().to_path_buf());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries.lock().unwrap().get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        match self.entries.lock().unwrap().get(path.as_ref()) {
            Some(MockEntry::File { mode, .. }) | Some(MockEntry::Dir { mode }) => Some(*mode),
            None => None,
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().unwrap().get(path),
            Some(MockEntry::File { .. })
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().unwrap().get(path),
            Some(MockEntry::Dir { .. })
        )
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir { .. }) => {
                let mut children: Vec<PathBuf> = entries
                    .keys()
                    .filter(|p| p.parent() == Some(path))
                    .cloned()
                    .collect();
                children.sort();
                Ok(children)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if self.failing_copies.lock().unwrap().contains(src) {
            return Err(anyhow!("Injected copy failure: {:?}", src));
        }
        let (content, mode) = match self.entries.lock().unwrap().get(src) {
            Some(MockEntry::File { content, mode }) => (content.clone(), *mode),
            Some(MockEntry::Dir { .. }) => return Err(anyhow!("Is a directory: {:?}", src)),
            None => return Err(anyhow!("File not found: {:?}", src)),
        };
        if !self.is_dir(dst.parent().unwrap_or(Path::new(""))) {
            return Err(anyhow!("Parent directory missing: {:?}", dst));
        }
        self.add_file_with_mode(dst, content, mode);
        Ok(())
    }

    fn copy_permissions(&self, src: &Path, dst: &Path) -> Result<()> {
        let mode = self
            .mode(src)
            .ok_or_else(|| anyhow!("File not found: {:?}", src))?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(dst) {
            Some(MockEntry::File { mode: m, .. }) | Some(MockEntry::Dir { mode: m }) => {
                *m = mode;
                Ok(())
            }
            None => Err(anyhow!("File not found: {:?}", dst)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }
}
