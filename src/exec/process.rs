// src/exec/process.rs

//! Run an external process to completion, capturing stdout and stderr as a
//! single stream in arrival order.

use std::borrow::Cow;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Combined output and exit status of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub output: Vec<u8>,
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl ProcessOutput {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Exit code for messages; `-1` when killed by a signal.
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }
}

/// Spawn `cmd` and wait for it, collecting both output streams.
///
/// The child is killed if the returned future is dropped before completion,
/// which is how deadlines cancel a call.
pub async fn run_captured(mut cmd: Command, label: &str) -> Result<ProcessOutput> {
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(process = label, "spawning process");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for {label}"))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone(), label.to_string(), "stdout");
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone(), label.to_string(), "stderr");
    }
    drop(tx);

    let mut output = Vec::new();
    while let Some(line) = rx.recv().await {
        output.extend_from_slice(&line);
        output.push(b'\n');
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of {label}"))?;

    debug!(
        process = label,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "process exited"
    );

    Ok(ProcessOutput {
        output,
        exit_code: status.code(),
        success: status.success(),
    })
}

fn forward_lines<R>(stream: R, tx: mpsc::UnboundedSender<Vec<u8>>, label: String, which: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut segments = BufReader::new(stream).split(b'\n');
        while let Ok(Some(mut line)) = segments.next_segment().await {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            debug!(process = %label, stream = which, "{}", String::from_utf8_lossy(&line));
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}
