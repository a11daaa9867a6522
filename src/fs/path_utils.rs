// src/fs/path_utils.rs

//! Lexical path helpers shared by the resolver, stager and rewriter.
//!
//! Nothing here touches the filesystem: two spellings of the same location
//! (`./data.txt`, `sub/../data.txt`) must map to the same remapping key
//! whether or not the file still exists.

use std::path::{Component, Path, PathBuf};

/// Join `path` onto `base` (unless already absolute) and normalise away
/// `.` and `..` components.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined)
}

/// Remove `.` components and fold `..` into the preceding component.
///
/// `..` at the root stays at the root, as on a real filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last path component as a string, falling back to the whole path.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// Returns `None` when `path` is not inside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
