// src/stage/remap.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Local absolute path → name of the staged copy inside the workspace.
///
/// Only the stager inserts entries, and only after the copy succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    entries: HashMap<PathBuf, String>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, absolute: PathBuf, staged_name: String) {
        self.entries.insert(absolute, staged_name);
    }

    pub fn get(&self, absolute: &Path) -> Option<&str> {
        self.entries.get(absolute).map(String::as_str)
    }

    pub fn contains(&self, absolute: &Path) -> bool {
        self.entries.contains_key(absolute)
    }

    /// True if some entry already stages a copy under `staged_name`.
    pub fn has_staged_name(&self, staged_name: &str) -> bool {
        self.entries.values().any(|v| v == staged_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_path(), v.as_str()))
    }
}
