// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RemoteCleanup;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to stage folder {path:?}: {source}")]
    FolderStaging {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Workspace error: {0}")]
    Workspace(String),

    /// A step against an existing host failed. `recovery` is the command the
    /// user should run to clean up whatever was left on the host.
    #[error("Remote host error: {message}")]
    Remote {
        message: String,
        recovery: Option<String>,
    },

    /// `cleanup` is what happened to the instance after the failure;
    /// `recovery` is only set when that cleanup did not complete.
    #[error("Provisioning error: {message}")]
    Provisioning {
        message: String,
        recovery: Option<String>,
        cleanup: RemoteCleanup,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BenchError {
    /// Manual cleanup instruction attached to the error, if any.
    pub fn recovery(&self) -> Option<&str> {
        match self {
            BenchError::Remote { recovery, .. } | BenchError::Provisioning { recovery, .. } => {
                recovery.as_deref()
            }
            _ => None,
        }
    }

    /// Destroy outcome carried by a provisioning failure.
    pub fn remote_cleanup(&self) -> Option<&RemoteCleanup> {
        match self {
            BenchError::Provisioning { cleanup, .. } => Some(cleanup),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BenchError>;
