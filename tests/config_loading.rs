// tests/config_loading.rs

mod common;
use crate::common::ConfigFileBuilder;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use benchrunner::config::{load_and_validate, load_effective, ConfigFile};
use benchrunner::errors::BenchError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_gives_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.remote.ssh_user, "ubuntu");
    assert_eq!(cfg.remote.remote_dir, "benchmark");
    assert_eq!(cfg.provision.template_dir, PathBuf::from("../aws"));
    assert_eq!(cfg.provision.engine_version, "1.7.5");
    assert_eq!(cfg.provision.instance_type, "t2.micro");
    assert_eq!(cfg.destroy_timeout(), Duration::from_secs(180));
    assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
}

#[test]
fn sections_override_defaults() {
    let file = write_config(
        r#"
[remote]
ssh_user = "ec2-user"
remote_dir = "/opt/bench"

[provision]
template_dir = "infra/aws"
instance_type = "c6i.large"
destroy_timeout_secs = 60
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.remote.ssh_user, "ec2-user");
    assert_eq!(cfg.remote.remote_dir, "/opt/bench");
    assert_eq!(cfg.provision.template_dir, PathBuf::from("infra/aws"));
    assert_eq!(cfg.provision.instance_type, "c6i.large");
    assert_eq!(cfg.destroy_timeout(), Duration::from_secs(60));
    assert_eq!(cfg.provision.engine_version, "1.7.5");
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config(
        r#"
[remote]
hostname = "10.0.0.5"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BenchError::TomlError(e)) => assert!(e.to_string().contains("hostname")),
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn zero_destroy_timeout_is_a_config_error() {
    let file = write_config(
        r#"
[provision]
destroy_timeout_secs = 0
"#,
    );

    match load_and_validate(file.path()) {
        Err(BenchError::ConfigError(msg)) => assert!(msg.contains("destroy_timeout_secs")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn engine_version_must_be_dotted_digits() {
    let raw = ConfigFileBuilder::new().engine_version("latest").raw();
    match ConfigFile::try_from(raw) {
        Err(BenchError::ConfigError(msg)) => assert!(msg.contains("engine_version")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    let ok = ConfigFileBuilder::new().engine_version("1.9.0").build();
    assert_eq!(ok.provision.engine_version, "1.9.0");
}

#[test]
fn blank_ssh_user_is_rejected() {
    let raw = ConfigFileBuilder::new().ssh_user("  ").raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(BenchError::ConfigError(_))
    ));
}

#[test]
fn blank_instance_type_is_rejected() {
    let raw = ConfigFileBuilder::new().instance_type("").raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(BenchError::ConfigError(_))
    ));
}

#[test]
fn explicit_missing_config_is_an_io_error() {
    let missing = std::env::temp_dir().join("benchrunner-no-such-config.toml");
    assert!(matches!(
        load_effective(Some(missing.as_path())),
        Err(BenchError::IoError(_))
    ));
}
