// src/rewrite.rs

//! Rewrite a command so it finds its staged dependencies inside the
//! workspace.
//!
//! The binary name of each sub-command is kept verbatim (only its location
//! changed). Every later token spelled under the supplied folder path becomes
//! `<folder name>/<relative path>`; every token whose absolute form is in the
//! remapping table becomes the staged name; flags and everything else are
//! left alone. Tokens are rejoined with single spaces and never re-quoted.

use std::path::{Component, Path};

use crate::command::model::{is_flag, strip_quotes};
use crate::command::{join_sub_commands, CommandLine, SubCommand};
use crate::fs::path_utils::{absolutize, relative_str};
use crate::stage::{RemapTable, StagedFolder};

pub struct Rewriter<'a> {
    remap: &'a RemapTable,
    folder: Option<&'a StagedFolder>,
    /// Directory relative tokens are resolved against.
    base_dir: &'a Path,
}

impl<'a> Rewriter<'a> {
    pub fn new(remap: &'a RemapTable, folder: Option<&'a StagedFolder>, base_dir: &'a Path) -> Self {
        Self {
            remap,
            folder,
            base_dir,
        }
    }

    /// Rewrite every sub-command and join them back with `&&`.
    pub fn rewrite_command(&self, command: &CommandLine) -> String {
        join_sub_commands(
            command
                .sub_commands()
                .iter()
                .map(|sub| self.rewrite_sub_command(sub)),
        )
    }

    pub fn rewrite_sub_command(&self, sub: &SubCommand) -> String {
        let mut out: Vec<String> = Vec::with_capacity(sub.tokens().len());
        if let Some(binary) = sub.binary() {
            out.push(binary.to_string());
        }
        for token in sub.arguments() {
            out.push(self.rewrite_token(token).unwrap_or_else(|| token.clone()));
        }
        out.join(" ")
    }

    /// The replacement for `token`, or `None` if it stays as is.
    fn rewrite_token(&self, token: &str) -> Option<String> {
        let value = strip_quotes(token);
        if value.is_empty() || is_flag(value) {
            return None;
        }

        if let Some(folder) = self.folder {
            if let Some(rel) = spelled_under(&folder.supplied, Path::new(value)) {
                return Some(if rel.is_empty() {
                    folder.name.clone()
                } else {
                    format!("{}/{}", folder.name, rel)
                });
            }
        }

        let absolute = absolutize(self.base_dir, Path::new(value));
        self.remap.get(&absolute).map(str::to_string)
    }
}

/// The part of `token` after the `supplied` folder prefix, compared
/// component by component on the spelling alone.
///
/// `--folder .` only claims tokens that start with `./`; a rest that climbs
/// back out with `..` does not count as inside.
fn spelled_under(supplied: &Path, token: &Path) -> Option<String> {
    let rest = relative_str(supplied, token)?;
    if Path::new(&rest)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(rest)
}
