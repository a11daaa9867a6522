// src/command/resolve.rs

//! Dependency discovery.
//!
//! From a parsed [`CommandLine`], work out which local artifacts the command
//! needs on the remote side:
//! - the first token of every sub-command, if it resolves on the search path
//!   (a `Binary` dependency);
//! - every later non-flag token that names an existing regular file
//!   (a `File` dependency).
//!
//! Everything else is assumed to already exist remotely.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::command::locator::BinaryLocator;
use crate::command::model::{is_flag, strip_quotes, CommandLine};
use crate::fs::path_utils::absolutize;
use crate::fs::FileSystem;
use crate::types::DependencyKind;

/// A local artifact the command depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub kind: DependencyKind,
    /// The token exactly as it appeared in the command.
    pub original_token: String,
    /// Where the artifact lives on this machine.
    pub absolute_path: PathBuf,
}

/// Output of [`DependencyResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: CommandLine,
    /// Directory relative tokens were resolved against.
    pub base_dir: PathBuf,
    /// Binaries first (in sub-command order), then files (in token order).
    pub dependencies: Vec<ResolvedDependency>,
}

impl Resolution {
    pub fn binaries(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::Binary)
    }

    pub fn files(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::File)
    }
}

pub struct DependencyResolver<'a> {
    fs: &'a dyn FileSystem,
    locator: &'a dyn BinaryLocator,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, locator: &'a dyn BinaryLocator) -> Self {
        Self { fs, locator }
    }

    pub fn resolve(&self, raw_command: &str) -> Result<Resolution> {
        let command = CommandLine::parse(raw_command);
        let base_dir = self.fs.current_dir()?;
        debug!(
            sub_commands = command.sub_commands().len(),
            "parsed command line"
        );

        let mut seen: HashSet<(DependencyKind, PathBuf)> = HashSet::new();
        let mut binaries = Vec::new();
        let mut files = Vec::new();

        for (idx, sub) in command.sub_commands().iter().enumerate() {
            let Some(binary) = sub.binary() else {
                continue;
            };
            match self.locator.locate(binary) {
                Some(path) => {
                    let path = absolutize(&base_dir, &path);
                    debug!(part = idx + 1, binary, path = %path.display(), "resolved binary");
                    if seen.insert((DependencyKind::Binary, path.clone())) {
                        binaries.push(ResolvedDependency {
                            kind: DependencyKind::Binary,
                            original_token: binary.to_string(),
                            absolute_path: path,
                        });
                    }
                }
                None => {
                    warn!(
                        part = idx + 1,
                        binary,
                        "binary not found on PATH; relying on the remote system to provide it"
                    );
                }
            }
        }

        for sub in command.sub_commands() {
            for token in sub.arguments() {
                if let Some(path) = self.file_token(&base_dir, token) {
                    if seen.insert((DependencyKind::File, path.clone())) {
                        info!(path = %path.display(), "found file in command");
                        files.push(ResolvedDependency {
                            kind: DependencyKind::File,
                            original_token: token.clone(),
                            absolute_path: path,
                        });
                    }
                }
            }
        }

        binaries.extend(files);
        Ok(Resolution {
            command,
            base_dir,
            dependencies: binaries,
        })
    }

    /// Absolute path of `token` if it is a non-flag naming an existing file.
    fn file_token(&self, base_dir: &Path, token: &str) -> Option<PathBuf> {
        if is_flag(token) {
            return None;
        }
        let value = strip_quotes(token);
        if value.is_empty() {
            return None;
        }
        let path = absolutize(base_dir, Path::new(value));
        self.fs.is_file(&path).then_some(path)
    }
}
