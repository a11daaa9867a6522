// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod exec;
pub mod filter;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod rewrite;
pub mod stage;
pub mod teardown;
pub mod types;

use std::io::Write;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::command::{BinaryLocator, PathLocator};
use crate::config::load_effective;
use crate::config::model::ConfigFile;
use crate::errors::{BenchError, Result};
use crate::exec::{
    ExecutionBackend, ExistingHostBackend, ProvisionedBackend, SshTarget, SshTransport,
    TerraformCli,
};
use crate::fs::path_utils::absolutize;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{Pipeline, RunOutcome, RunRequest};
use crate::progress::Progress;
use crate::teardown::{report_remote_cleanup, WorkspaceCleanup};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (CLI flags override the file)
/// - backend selection (`--host` or a provisioned instance)
/// - the staging / execution pipeline
/// - printing the filtered output and cleanup reports
pub async fn run(args: CliArgs, progress: Progress) -> Result<()> {
    let cfg = load_effective(args.config.as_deref())?;
    let fs = RealFileSystem::new();
    let locator = PathLocator;

    let request = RunRequest {
        command: command_from_args(&args, &locator)?,
        folder: args.folder.clone(),
    };
    let pipeline = Pipeline::new(&fs, &locator, &progress);

    if args.dry_run {
        return print_dry_run(&pipeline, &request, &args, &cfg);
    }

    let mut backend = build_backend(&args, &cfg, &fs, progress.clone())?;
    let outcome = pipeline.execute(&request, backend.as_mut()).await;
    finish(outcome, &progress)
}

/// Turn the command-line forms into one command string.
///
/// - `--command "<cmd>"` or a single positional value: used verbatim.
/// - Several positional values: joined with spaces; the first one must
///   be an executable on the search path.
pub fn command_from_args(args: &CliArgs, locator: &dyn BinaryLocator) -> Result<String> {
    match (args.positional.as_slice(), &args.command) {
        ([], Some(cmd)) => Ok(cmd.clone()),
        ([], None) => Err(BenchError::InvalidInput(
            "no command given; pass it as an argument or with --command".to_string(),
        )),
        ([single], None) => Ok(single.clone()),
        ([binary, ..], None) => {
            if locator.locate(binary).is_none() {
                return Err(BenchError::InvalidInput(format!(
                    "binary '{binary}' not found in PATH"
                )));
            }
            Ok(args.positional.join(" "))
        }
        (_, Some(_)) => Err(BenchError::InvalidInput(
            "give the command either positionally or with --command, not both".to_string(),
        )),
    }
}

/// Pick the backend for this run.
pub fn build_backend(
    args: &CliArgs,
    cfg: &ConfigFile,
    fs: &dyn FileSystem,
    progress: Progress,
) -> Result<Box<dyn ExecutionBackend>> {
    match &args.host {
        Some(host) => {
            let target = SshTarget {
                host: host.clone(),
                user: args
                    .ssh_user
                    .clone()
                    .unwrap_or_else(|| cfg.remote.ssh_user.clone()),
                key: args.ssh_key.clone(),
                connect_timeout: cfg.connect_timeout(),
            };
            debug!(destination = %target.destination(), "using existing host");
            Ok(Box::new(ExistingHostBackend::new(
                SshTransport,
                target,
                &cfg.remote.remote_dir,
                progress,
            )))
        }
        None => {
            let cwd = fs.current_dir()?;
            let template = args
                .template_dir
                .as_deref()
                .unwrap_or(cfg.provision.template_dir.as_path());
            let template_dir = absolutize(&cwd, template);
            let instance_type = args
                .instance_type
                .clone()
                .unwrap_or_else(|| cfg.provision.instance_type.clone());
            debug!(
                template_dir = %template_dir.display(),
                instance_type = %instance_type,
                "using provisioned instance"
            );
            Ok(Box::new(ProvisionedBackend::new(
                TerraformCli::new(template_dir, cfg.provision.engine_version.clone()),
                instance_type,
                cfg.destroy_timeout(),
                progress,
            )))
        }
    }
}

/// Report cleanup, print the benchmark output and settle the result.
fn finish(outcome: RunOutcome, progress: &Progress) -> Result<()> {
    if let Some(WorkspaceCleanup::Failed { path, error }) = &outcome.workspace_cleanup {
        warn!(path = %path.display(), error = %error, "workspace was left behind; remove it by hand");
    }

    let output = match outcome.result {
        Ok(output) => output,
        Err(err) => {
            if let Some(cleanup) = err.remote_cleanup() {
                report_remote_cleanup(cleanup);
            }
            return Err(err);
        }
    };
    report_remote_cleanup(&output.remote_cleanup);

    progress.suspend(|| -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&output.filtered_output)?;
        stdout.flush()?;
        Ok(())
    })?;

    info!("benchmark completed successfully");
    Ok(())
}

/// Print what would be staged and run, without side effects.
fn print_dry_run(
    pipeline: &Pipeline<'_>,
    request: &RunRequest,
    args: &CliArgs,
    cfg: &ConfigFile,
) -> Result<()> {
    let resolution = pipeline.resolve(&request.command)?;

    println!("benchrunner dry-run");
    match &args.host {
        Some(host) => {
            let user = args.ssh_user.as_deref().unwrap_or(&cfg.remote.ssh_user);
            println!("  backend = existing host ({user}@{host})");
            println!("  remote_dir = {}", cfg.remote.remote_dir);
        }
        None => {
            let template = args
                .template_dir
                .as_deref()
                .unwrap_or(cfg.provision.template_dir.as_path());
            println!("  backend = provisioned instance");
            println!("  template_dir = {}", template.display());
            println!(
                "  instance_type = {}",
                args.instance_type
                    .as_deref()
                    .unwrap_or(&cfg.provision.instance_type)
            );
            println!("  engine_version = {}", cfg.provision.engine_version);
        }
    }
    println!("  base_dir = {}", resolution.base_dir.display());
    println!();

    println!("command: {}", resolution.command.raw());
    println!("dependencies ({}):", resolution.dependencies.len());
    for dep in &resolution.dependencies {
        println!(
            "  - [{}] {} -> {}",
            dep.kind,
            dep.original_token,
            dep.absolute_path.display()
        );
    }
    if let Some(folder) = &request.folder {
        let absolute = pipeline.check_folder(&resolution.base_dir, folder)?;
        println!("folder: {} -> {}", folder.display(), absolute.display());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
