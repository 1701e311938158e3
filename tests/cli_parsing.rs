// tests/cli_parsing.rs

use std::path::PathBuf;

use clap::Parser;

use bulkexec::cli::{CliArgs, LogFormat, LogLevel};

fn parse(raw: &[&str]) -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse_from(std::iter::once("bulkexec").chain(raw.iter().copied()))
}

#[test]
fn flags_after_the_command_belong_to_the_command() {
    let args = parse(&["ls", "-l", "--dry-run", "range(3)"]).expect("should parse");
    assert!(!args.dry_run);
    assert_eq!(args.command, ["ls", "-l", "--dry-run", "range(3)"]);
}

#[test]
fn quoted_flag_tokens_reach_the_command() {
    let args = parse(&["--shell", "ping", "'-h'"]).expect("should parse");
    assert!(args.shell);
    assert_eq!(args.command, ["ping", "'-h'"]);
}

#[test]
fn repeated_options_keep_the_last_value() {
    let args = parse(&["-o", "first.csv", "--output", "second.csv", "echo"]).expect("should parse");
    assert_eq!(args.output, Some(PathBuf::from("second.csv")));
}

#[test]
fn command_is_required() {
    assert!(parse(&[]).is_err());
    assert!(parse(&["--dry-run"]).is_err());
}

#[test]
fn zero_sequence_limit_is_rejected() {
    assert!(parse(&["--max-sequence-len", "0", "echo"]).is_err());
    assert!(parse(&["--max-sequence-len", "lots", "echo"]).is_err());
    let args = parse(&["--max-sequence-len", "10", "echo"]).expect("should parse");
    assert_eq!(args.max_sequence_len, Some(10));
}

#[test]
fn log_level_is_parsed() {
    let args = parse(&["--log-level", "debug", "echo"]).expect("should parse");
    assert_eq!(args.log_level, Some(LogLevel::Debug));
    assert!(parse(&["--log-level", "chatty", "echo"]).is_err());
    assert_eq!(parse(&["echo"]).expect("should parse").log_level, None);
}

#[test]
fn log_format_defaults_to_full() {
    assert_eq!(parse(&["echo"]).expect("should parse").log_format, LogFormat::Full);
    let args = parse(&["--log-format", "compact", "echo"]).expect("should parse");
    assert_eq!(args.log_format, LogFormat::Compact);
    let args = parse(&["--log-format", "pretty", "echo"]).expect("should parse");
    assert_eq!(args.log_format, LogFormat::Pretty);
    assert!(parse(&["--log-format", "%(message)s", "echo"]).is_err());
}

#[tokio::test]
async fn dry_run_succeeds_without_launching() {
    let args = parse(&["--dry-run", "definitely-not-a-program", "range(3)"]).expect("should parse");
    let code = bulkexec::run(args).await.expect("dry run should succeed");
    assert_eq!(code, 0);
}

#[tokio::test]
async fn unbounded_token_fails_the_run() {
    let args = parse(&["--dry-run", "echo", "range(10**12)"]).expect("should parse");
    let err = bulkexec::run(args).await.expect_err("run should fail");
    assert!(err.to_string().contains("unbounded"));
}
