// src/stage/stager.rs

//! Copy resolved dependencies (and optionally a whole folder) into a
//! workspace.
//!
//! Two failure policies live side by side here:
//! - inferred dependencies are staged best-effort: a failed copy is logged
//!   and skipped, the remote side may already have the artifact;
//! - an explicitly requested folder must be copied completely, any failure
//!   aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing::{debug, info, warn};

use crate::command::ResolvedDependency;
use crate::errors::{BenchError, Result};
use crate::fs::path_utils::{base_name, relative_str};
use crate::fs::FileSystem;
use crate::progress::Progress;
use crate::stage::remap::RemapTable;
use crate::types::DependencyKind;

/// A folder copied into the workspace as `<workspace>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFolder {
    /// Absolute location of the source folder.
    pub source: PathBuf,
    /// The folder path as the user supplied it.
    pub supplied: PathBuf,
    /// Name of the copy inside the workspace.
    pub name: String,
}

/// Everything the rewriter needs to know about a staged workspace.
#[derive(Debug, Clone, Default)]
pub struct StagingResult {
    pub remap: RemapTable,
    pub folder: Option<StagedFolder>,
}

pub struct Stager<'a> {
    fs: &'a dyn FileSystem,
    progress: &'a Progress,
}

impl<'a> Stager<'a> {
    pub fn new(fs: &'a dyn FileSystem, progress: &'a Progress) -> Self {
        Self { fs, progress }
    }

    /// Stage dependencies and the optional folder into `workspace_root`.
    ///
    /// `folder` is `(supplied, absolute)`; the absolute path must already be
    /// known to be a directory.
    pub fn stage(
        &self,
        workspace_root: &Path,
        dependencies: &[ResolvedDependency],
        folder: Option<(&Path, &Path)>,
    ) -> Result<StagingResult> {
        let mut remap = self.stage_dependencies(workspace_root, dependencies);

        let folder = match folder {
            Some((supplied, absolute)) => {
                Some(self.stage_folder(workspace_root, supplied, absolute, &mut remap)?)
            }
            None => None,
        };

        Ok(StagingResult { remap, folder })
    }

    /// Copy binaries, then files not already staged. Never fails.
    pub fn stage_dependencies(
        &self,
        workspace_root: &Path,
        dependencies: &[ResolvedDependency],
    ) -> RemapTable {
        let mut remap = RemapTable::new();

        let ordered = dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::Binary)
            .chain(
                dependencies
                    .iter()
                    .filter(|d| d.kind == DependencyKind::File),
            );

        for dep in ordered {
            if remap.contains(&dep.absolute_path) {
                debug!(path = %dep.absolute_path.display(), "already staged; skipping");
                continue;
            }

            let name = base_name(&dep.absolute_path);
            if remap.has_staged_name(&name) {
                warn!(
                    kind = %dep.kind,
                    path = %dep.absolute_path.display(),
                    name = %name,
                    "another dependency is already staged under this name; skipping"
                );
                continue;
            }

            let dest = workspace_root.join(&name);
            match self.fs.copy_file(&dep.absolute_path, &dest) {
                Ok(()) => {
                    debug!(
                        kind = %dep.kind,
                        src = %dep.absolute_path.display(),
                        dst = %dest.display(),
                        "staged dependency"
                    );
                    remap.insert(dep.absolute_path.clone(), name);
                }
                Err(err) => {
                    warn!(
                        kind = %dep.kind,
                        path = %dep.absolute_path.display(),
                        error = %err,
                        "failed to stage dependency; continuing without it"
                    );
                }
            }
        }

        remap
    }

    /// Recursively copy `absolute` into `<workspace_root>/<folder name>`.
    pub fn stage_folder(
        &self,
        workspace_root: &Path,
        supplied: &Path,
        absolute: &Path,
        remap: &mut RemapTable,
    ) -> Result<StagedFolder> {
        let name = base_name(absolute);
        let dest = workspace_root.join(&name);
        info!(folder = %absolute.display(), "copying folder into benchmark workspace");

        let _spinner = self.progress.spinner(format!("Copying {name} files..."));
        let mut copier = TreeCopier {
            fs: self.fs,
            folder_root: absolute,
            folder_name: &name,
            skip: workspace_root,
            remap,
        };
        copier
            .copy_tree(absolute, &dest)
            .map_err(|source| BenchError::FolderStaging {
                path: absolute.to_path_buf(),
                source,
            })?;

        info!(folder = %name, "folder copied successfully");
        Ok(StagedFolder {
            source: absolute.to_path_buf(),
            supplied: supplied.to_path_buf(),
            name,
        })
    }
}

struct TreeCopier<'a> {
    fs: &'a dyn FileSystem,
    folder_root: &'a Path,
    folder_name: &'a str,
    /// The workspace itself, which may live inside the folder being copied.
    skip: &'a Path,
    remap: &'a mut RemapTable,
}

impl TreeCopier<'_> {
    fn copy_tree(&mut self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        self.fs.create_dir_all(dst)?;

        for entry in self.fs.read_dir(src)? {
            if entry == self.skip {
                continue;
            }
            let file_name = entry
                .file_name()
                .ok_or_else(|| anyhow!("directory entry without a name: {:?}", entry))?;
            let target = dst.join(file_name);

            if self.fs.is_dir(&entry) {
                self.copy_tree(&entry, &target)?;
            } else {
                self.fs.copy_file(&entry, &target)?;
                let rel = relative_str(self.folder_root, &entry)
                    .with_context(|| format!("{:?} is outside {:?}", entry, self.folder_root))?;
                self.remap
                    .insert(entry.clone(), format!("{}/{}", self.folder_name, rel));
            }
        }

        // Applied last so a read-only source dir doesn't block the copy.
        self.fs.copy_permissions(src, dst)?;
        Ok(())
    }
}
