// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use bulkexec::cli::CliArgs;
use bulkexec::config::{ConfigFile, Settings, load_and_validate, load_from_str};
use bulkexec::errors::BulkExecError;
use bulkexec::expr::{DEFAULT_MAX_SEQUENCE_LEN, Limits};
use bulkexec::types::LaunchFailurePolicy;
use bulkexec_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn args(raw: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("bulkexec").chain(raw.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn full_config_file_is_loaded() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bulkexec.toml");
    fs::write(
        &path,
        r#"
[expand]
max_sequence_len = 500

[run]
on_launch_failure = "continue"
shell = true
output = "results.csv"
"#,
    )?;

    let config = load_and_validate(&path)?;
    assert_eq!(config.expand.max_sequence_len, 500);
    assert_eq!(config.run.on_launch_failure, LaunchFailurePolicy::Continue);
    assert!(config.run.shell);
    assert_eq!(config.run.output, Some(PathBuf::from("results.csv")));
    Ok(())
}

#[test]
fn empty_file_means_defaults() -> TestResult {
    let config = ConfigFile::try_from(load_from_str("")?)?;
    assert_eq!(config, ConfigFile::default());
    assert_eq!(config.expand.max_sequence_len, DEFAULT_MAX_SEQUENCE_LEN);
    assert_eq!(config.run.on_launch_failure, LaunchFailurePolicy::Abort);
    assert!(!config.run.shell);
    assert_eq!(config.run.output, None);
    Ok(())
}

#[test]
fn zero_sequence_limit_is_rejected() {
    let raw = ConfigFileBuilder::new().max_sequence_len(0).build_raw();
    match ConfigFile::try_from(raw) {
        Err(BulkExecError::ConfigError(msg)) => assert!(msg.contains("max_sequence_len")),
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn empty_output_path_is_rejected() {
    let raw = ConfigFileBuilder::new().output("").build_raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(BulkExecError::ConfigError(_))
    ));
}

#[test]
fn unknown_policy_fails_to_parse() {
    let result = load_from_str("[run]\non_launch_failure = \"retry\"\n");
    assert!(matches!(result, Err(BulkExecError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let result = load_and_validate(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(BulkExecError::IoError(_))));
    Ok(())
}

#[test]
fn settings_fall_back_to_defaults() {
    let settings = Settings::resolve(&args(&["echo", "range(3)"]), None);
    assert_eq!(settings.limits, Limits::default());
    assert_eq!(settings.on_launch_failure, LaunchFailurePolicy::Abort);
    assert!(!settings.shell);
    assert!(!settings.dry_run);
    assert_eq!(settings.output, None);
}

#[test]
fn settings_take_values_from_the_file() {
    let config = ConfigFileBuilder::new()
        .max_sequence_len(50)
        .on_launch_failure(LaunchFailurePolicy::Continue)
        .shell(true)
        .output("from-file.csv")
        .build();

    let settings = Settings::resolve(&args(&["echo", "x"]), Some(&config));
    assert_eq!(settings.limits, Limits::new(50));
    assert_eq!(settings.on_launch_failure, LaunchFailurePolicy::Continue);
    assert!(settings.shell);
    assert_eq!(settings.output, Some(PathBuf::from("from-file.csv")));
}

#[test]
fn cli_flags_override_the_file() {
    let config = ConfigFileBuilder::new()
        .max_sequence_len(50)
        .output("from-file.csv")
        .build();

    let settings = Settings::resolve(
        &args(&[
            "--max-sequence-len",
            "7",
            "-o",
            "from-cli.csv",
            "--keep-going",
            "--dry-run",
            "echo",
        ]),
        Some(&config),
    );
    assert_eq!(settings.limits, Limits::new(7));
    assert_eq!(settings.output, Some(PathBuf::from("from-cli.csv")));
    assert_eq!(settings.on_launch_failure, LaunchFailurePolicy::Continue);
    assert!(settings.dry_run);
}
