// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `bulkexec`.
///
/// Options must come before the command. Everything from the command on is
/// handed to expansion untouched, flag-like tokens included, so
/// `bulkexec ping "'-h'"` and `bulkexec ls -l "range(3)"` both work.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bulkexec",
    version,
    about = "Run a command once per element of the expressions in its arguments.",
    long_about = None,
    args_override_self = true
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BULKEXEC_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Layout of log lines on stderr.
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    /// Capture every invocation's output and record it to this CSV file.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Optional config file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep going when a program cannot be launched (counts as exit code 127).
    #[arg(long)]
    pub keep_going: bool,

    /// Run each invocation through the platform shell.
    #[arg(long)]
    pub shell: bool,

    /// Longest sequence a single argument may expand to.
    #[arg(long, value_name = "N", value_parser = parse_sequence_len)]
    pub max_sequence_len: Option<usize>,

    /// Print the expanded invocations instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// The command and its arguments; each argument may be an expression.
    #[arg(
        required = true,
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Log line layout, mapped onto the `tracing-subscriber` formatters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, source location and message on one line.
    #[default]
    Full,
    /// One line without the source location.
    Compact,
    /// Multi-line, human-oriented output.
    Pretty,
}

fn parse_sequence_len(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
