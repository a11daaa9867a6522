// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `benchrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "benchrunner",
    version,
    about = "Stage a command with its local dependencies and benchmark it on a remote machine.",
    long_about = None
)]
pub struct CliArgs {
    /// Command to benchmark.
    ///
    /// A single value is taken as the whole command line. Several values are
    /// joined with spaces; the first one must then be found on `PATH`.
    #[arg(value_name = "COMMAND", conflicts_with = "command")]
    pub positional: Vec<String>,

    /// Command to benchmark (alternative to the positional form).
    #[arg(long, value_name = "COMMAND")]
    pub command: Option<String>,

    /// Address of an existing machine to run the benchmark on.
    ///
    /// Without it a disposable instance is provisioned.
    #[arg(long, value_name = "ADDRESS")]
    pub host: Option<String>,

    /// Private key used to reach `--host`.
    #[arg(long, value_name = "PATH", requires = "host")]
    pub ssh_key: Option<PathBuf>,

    /// User used to reach `--host` (default from config, else `ubuntu`).
    #[arg(long, value_name = "USER")]
    pub ssh_user: Option<String>,

    /// Folder copied as a whole into the workspace.
    #[arg(long, value_name = "PATH")]
    pub folder: Option<PathBuf>,

    /// Instance type for the provisioned machine.
    #[arg(long, value_name = "TYPE")]
    pub instance_type: Option<String>,

    /// Template directory handed to the provisioning engine.
    #[arg(long, value_name = "PATH")]
    pub template_dir: Option<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Benchrunner.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Shorthand for `--log-level debug`.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BENCHRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve dependencies and print the plan without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Level requested on the command line, `--log-level` winning over `--debug`.
    pub fn requested_log_level(&self) -> Option<LogLevel> {
        match (self.log_level, self.debug) {
            (Some(lvl), _) => Some(lvl),
            (None, true) => Some(LogLevel::Debug),
            (None, false) => None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
