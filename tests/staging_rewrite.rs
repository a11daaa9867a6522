// tests/staging_rewrite.rs

mod common;
use crate::common::{init_tracing, stage_and_rewrite, TreeBuilder};

use std::path::{Path, PathBuf};

use benchrunner::command::{CommandLine, DependencyResolver};
use benchrunner::errors::BenchError;
use benchrunner::fs::mock::MockFileSystem;
use benchrunner::progress::Progress;
use benchrunner::rewrite::Rewriter;
use benchrunner::stage::{Stager, Workspace, WORKSPACE_PREFIX};
use benchrunner_test_utils::StaticLocator;

#[test]
fn absolute_file_token_becomes_its_base_name() {
    init_tracing();
    let tree = TreeBuilder::new().file("data/input.txt", "1 2 3");
    let workspace = TreeBuilder::new();
    let input = tree.path("data/input.txt");
    let locator = StaticLocator::new();

    let command = format!("wc -w {}", input.display());
    let (staged, rewritten) =
        stage_and_rewrite(&tree.root(), &workspace.root(), &locator, &command, None);

    assert_eq!(rewritten, "wc -w input.txt");
    assert_eq!(staged.remap.get(&input), Some("input.txt"));
    assert_eq!(
        std::fs::read_to_string(workspace.path("input.txt")).unwrap(),
        "1 2 3"
    );
}

#[test]
fn binary_is_staged_and_its_name_kept() {
    let tree = TreeBuilder::new().file("bin/bench", "#!/bin/sh\necho hi\n");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new().with("bench", tree.path("bin/bench"));

    let (staged, rewritten) =
        stage_and_rewrite(&tree.root(), &workspace.root(), &locator, "bench --fast", None);

    assert_eq!(rewritten, "bench --fast");
    assert!(workspace.path("bench").is_file());
    assert_eq!(staged.remap.len(), 1);
}

#[cfg(unix)]
#[test]
fn staged_binary_keeps_its_mode() {
    use std::os::unix::fs::PermissionsExt;

    let tree = TreeBuilder::new().executable("bin/bench", "#!/bin/sh\n");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new().with("bench", tree.path("bin/bench"));

    stage_and_rewrite(&tree.root(), &workspace.root(), &locator, "bench", None);

    let mode = std::fs::metadata(workspace.path("bench"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn rewriting_twice_changes_nothing() {
    let tree = TreeBuilder::new()
        .file("a/left.txt", "l")
        .file("b/right.txt", "r");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new();

    let command = format!(
        "diff {} b/right.txt && cat a/left.txt",
        tree.path("a/left.txt").display()
    );
    let (staged, once) =
        stage_and_rewrite(&tree.root(), &workspace.root(), &locator, &command, None);
    assert_eq!(once, "diff left.txt right.txt && cat left.txt");

    let root = tree.root();
    let twice = Rewriter::new(&staged.remap, staged.folder.as_ref(), &root)
        .rewrite_command(&CommandLine::parse(once.clone()));
    assert_eq!(twice, once);
}

#[test]
fn base_name_collision_keeps_the_first_copy() {
    let tree = TreeBuilder::new()
        .file("a/data.txt", "first")
        .file("b/data.txt", "second");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new();

    let (staged, rewritten) = stage_and_rewrite(
        &tree.root(),
        &workspace.root(),
        &locator,
        "cat a/data.txt b/data.txt",
        None,
    );

    assert_eq!(rewritten, "cat data.txt b/data.txt");
    assert_eq!(staged.remap.len(), 1);
    assert_eq!(
        std::fs::read_to_string(workspace.path("data.txt")).unwrap(),
        "first"
    );
}

#[test]
fn folder_tokens_keep_their_relative_layout() {
    let tree = TreeBuilder::new()
        .file("project/src/main.py", "print('hi')")
        .file("project/data/sets/a.csv", "1,2")
        .dir("project/empty");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new();

    let (staged, rewritten) = stage_and_rewrite(
        &tree.root(),
        &workspace.root(),
        &locator,
        "python3 project/src/main.py --input project/data/sets/a.csv --out project",
        Some(Path::new("project")),
    );

    assert_eq!(
        rewritten,
        "python3 project/src/main.py --input project/data/sets/a.csv --out project"
    );
    let folder = staged.folder.expect("folder staged");
    assert_eq!(folder.name, "project");
    assert_eq!(folder.source, tree.path("project"));
    assert_eq!(folder.supplied, PathBuf::from("project"));

    assert!(workspace.path("project/src/main.py").is_file());
    assert!(workspace.path("project/data/sets/a.csv").is_file());
    assert!(workspace.path("project/empty").is_dir());
    assert_eq!(
        staged.remap.get(&tree.path("project/data/sets/a.csv")),
        Some("project/data/sets/a.csv")
    );
}

#[test]
fn folder_given_by_absolute_path_rewrites_absolute_tokens() {
    let tree = TreeBuilder::new().file("suite/cases/one.txt", "1");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new();
    let suite = tree.path("suite");

    let command = format!("run {}/cases/one.txt", suite.display());
    let (_, rewritten) = stage_and_rewrite(
        &tree.root(),
        &workspace.root(),
        &locator,
        &command,
        Some(suite.as_path()),
    );

    assert_eq!(rewritten, "run suite/cases/one.txt");
}

#[test]
fn current_dir_folder_leaves_words_and_flags_alone() {
    let tree = TreeBuilder::new().file("data.txt", "d");
    let workspace = TreeBuilder::new();
    let locator = StaticLocator::new();
    let root = tree.root();
    let name = root.file_name().unwrap().to_string_lossy().into_owned();

    let (_, plain) = stage_and_rewrite(
        &root,
        &workspace.root(),
        &locator,
        "echo hello -n 10",
        Some(Path::new(".")),
    );
    assert_eq!(plain, "echo hello -n 10");

    let other = TreeBuilder::new();
    let (_, with_file) = stage_and_rewrite(
        &root,
        &other.root(),
        &locator,
        "head -n 1 ./data.txt && wc -c data.txt --total",
        Some(Path::new(".")),
    );
    assert_eq!(
        with_file,
        format!("head -n 1 {name}/data.txt && wc -c {name}/data.txt --total")
    );
}

#[test]
fn workspace_inside_the_folder_is_not_copied_into_itself() {
    let tree = TreeBuilder::new().file("input.txt", "x");
    let workspace = Workspace::create_in(&tree.root()).unwrap();
    let locator = StaticLocator::new();

    let root = tree.root();
    let (_, rewritten) = stage_and_rewrite(
        &root,
        workspace.root(),
        &locator,
        "cat input.txt",
        Some(root.as_path()),
    );

    let name = root.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(rewritten, format!("cat {name}/input.txt"));
    let copied: Vec<_> = std::fs::read_dir(workspace.root().join(&name))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(copied, vec!["input.txt"]);
    assert!(
        workspace
            .root()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX)
    );
    workspace.remove().unwrap();
}

#[test]
fn failed_dependency_copy_is_skipped() {
    init_tracing();
    let fs = MockFileSystem::new("/work");
    fs.add_file("/work/broken.txt", b"x".to_vec());
    fs.add_file("/work/fine.txt", b"y".to_vec());
    fs.add_dir("/ws");
    fs.fail_copies_from("/work/broken.txt");
    let locator = StaticLocator::new();
    let progress = Progress::hidden();

    let resolution = DependencyResolver::new(&fs, &locator)
        .resolve("cat broken.txt fine.txt")
        .unwrap();
    let staged = Stager::new(&fs, &progress)
        .stage(Path::new("/ws"), &resolution.dependencies, None)
        .expect("best-effort staging never fails");

    assert!(!staged.remap.contains(Path::new("/work/broken.txt")));
    assert_eq!(fs.contents("/ws/fine.txt"), Some(b"y".to_vec()));

    let rewritten = Rewriter::new(&staged.remap, None, Path::new("/work"))
        .rewrite_command(&resolution.command);
    assert_eq!(rewritten, "cat broken.txt fine.txt");
}

#[test]
fn failed_folder_copy_aborts() {
    let fs = MockFileSystem::new("/work");
    fs.add_file("/work/proj/a.txt", b"a".to_vec());
    fs.add_file("/work/proj/b.txt", b"b".to_vec());
    fs.add_dir("/ws");
    fs.fail_copies_from("/work/proj/b.txt");
    let progress = Progress::hidden();

    let result = Stager::new(&fs, &progress).stage(
        Path::new("/ws"),
        &[],
        Some((Path::new("proj"), Path::new("/work/proj"))),
    );

    match result {
        Err(BenchError::FolderStaging { path, .. }) => {
            assert_eq!(path, PathBuf::from("/work/proj"));
        }
        Err(e) => panic!("Expected FolderStaging error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn folder_permissions_are_carried_over() {
    let fs = MockFileSystem::new("/work");
    fs.add_file_with_mode("/work/proj/run.sh", b"#!/bin/sh".to_vec(), 0o755);
    fs.add_dir("/ws");
    let progress = Progress::hidden();

    Stager::new(&fs, &progress)
        .stage(
            Path::new("/ws"),
            &[],
            Some((Path::new("proj"), Path::new("/work/proj"))),
        )
        .unwrap();

    assert_eq!(fs.mode("/ws/proj/run.sh"), Some(0o755));
}
