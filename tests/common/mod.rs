#![allow(dead_code)]

use std::path::Path;

use benchrunner::command::{DependencyResolver, Resolution};
use benchrunner::fs::RealFileSystem;
use benchrunner::progress::Progress;
use benchrunner::rewrite::Rewriter;
use benchrunner::stage::{Stager, StagingResult};
use benchrunner_test_utils::StaticLocator;

pub use benchrunner_test_utils::builders::{ConfigFileBuilder, TreeBuilder};
pub use benchrunner_test_utils::init_tracing;

/// Resolve `command` with `dir` as the working directory.
pub fn resolve_in(dir: &Path, locator: &StaticLocator, command: &str) -> Resolution {
    let fs = RealFileSystem::with_current_dir(dir);
    DependencyResolver::new(&fs, locator)
        .resolve(command)
        .expect("resolve")
}

/// Resolve, stage into `workspace` and rewrite `command` against the real
/// filesystem.
pub fn stage_and_rewrite(
    dir: &Path,
    workspace: &Path,
    locator: &StaticLocator,
    command: &str,
    folder: Option<&Path>,
) -> (StagingResult, String) {
    let fs = RealFileSystem::with_current_dir(dir);
    let progress = Progress::hidden();
    let resolution = DependencyResolver::new(&fs, locator)
        .resolve(command)
        .expect("resolve");

    let folder_abs = folder.map(|f| benchrunner::fs::path_utils::absolutize(dir, f));
    let staged = Stager::new(&fs, &progress)
        .stage(
            workspace,
            &resolution.dependencies,
            folder.zip(folder_abs.as_deref()),
        )
        .expect("stage");
    let rewritten = Rewriter::new(&staged.remap, staged.folder.as_ref(), &resolution.base_dir)
        .rewrite_command(&resolution.command);
    (staged, rewritten)
}
