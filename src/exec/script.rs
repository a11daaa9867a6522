// src/exec/script.rs

//! Generated shell text that runs the benchmark command three times.

use std::borrow::Cow;

use crate::filter::{OUTPUT_TAG, SENTINEL_END, SENTINEL_START};

/// How many times each backend issues the command.
pub const RUN_COUNT: usize = 3;

/// File name of the wrapper script inside the workspace.
pub const SCRIPT_NAME: &str = "run_benchmark.sh";

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(s)).into_owned()
}

/// Wrapper script for the existing-host backend.
///
/// All output goes to stdout; the runs are framed by the sentinel markers
/// and labelled `Run 1..=3`.
pub fn sentinel_script(remote_dir: &str, command: &str) -> String {
    let mut script = String::from("#!/bin/bash\n");
    script.push_str("exec 2>&1\n");
    script.push_str(&format!("cd {} || exit 1\n", shell_quote(remote_dir)));
    script.push_str(&format!("echo \"{SENTINEL_START}\"\n"));
    for run in 1..=RUN_COUNT {
        script.push_str(&format!("echo \"Run {run}\"\n"));
        script.push_str(command);
        script.push('\n');
    }
    script.push_str(&format!("echo \"{SENTINEL_END}\"\n"));
    script
}

/// Single-line command for the provisioned instance.
///
/// Every line the command prints, and each run label, is prefixed with the
/// output tag so it can be told apart from the engine's own narration.
pub fn tagged_command(command: &str) -> String {
    let tag_lines = shell_quote(&format!("s/^/{OUTPUT_TAG} /"));
    (1..=RUN_COUNT)
        .map(|run| {
            format!(
                "echo {label}; {{ {command}; }} 2>&1 | sed {tag_lines}",
                label = shell_quote(&format!("{OUTPUT_TAG} Run {run}")),
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
