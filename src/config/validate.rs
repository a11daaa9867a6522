// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BenchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BenchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.remote, raw.provision))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_remote(cfg)?;
    validate_provision(cfg)?;
    Ok(())
}

fn validate_remote(cfg: &RawConfigFile) -> Result<()> {
    if cfg.remote.ssh_user.trim().is_empty() {
        return Err(BenchError::ConfigError(
            "[remote].ssh_user must not be empty".to_string(),
        ));
    }
    if cfg.remote.remote_dir.trim().is_empty() {
        return Err(BenchError::ConfigError(
            "[remote].remote_dir must not be empty".to_string(),
        ));
    }
    if cfg.remote.connect_timeout_secs == 0 {
        return Err(BenchError::ConfigError(
            "[remote].connect_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_provision(cfg: &RawConfigFile) -> Result<()> {
    let version = cfg.provision.engine_version.trim();
    let well_formed = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(BenchError::ConfigError(format!(
            "[provision].engine_version must look like MAJOR.MINOR.PATCH (got {:?})",
            cfg.provision.engine_version
        )));
    }
    if cfg.provision.instance_type.trim().is_empty() {
        return Err(BenchError::ConfigError(
            "[provision].instance_type must not be empty".to_string(),
        ));
    }
    if cfg.provision.destroy_timeout_secs == 0 {
        return Err(BenchError::ConfigError(
            "[provision].destroy_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
