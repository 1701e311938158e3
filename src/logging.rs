// src/logging.rs

//! Logging setup for `bulkexec` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `BULKEXEC_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`
//!
//! The line layout comes from `--log-format`. Logs are sent to STDERR so
//! that stdout carries only child output.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::{LogFormat, LogLevel};

pub const LOG_ENV_VAR: &str = "BULKEXEC_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, format: LogFormat) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    let builder = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(shows_location(format))
        .with_line_number(shows_location(format))
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

fn shows_location(format: LogFormat) -> bool {
    !matches!(format, LogFormat::Compact)
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::WARN),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" | "critical" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_beats_environment() {
        assert_eq!(
            resolve_level(Some(LogLevel::Debug), Some("error")),
            tracing::Level::DEBUG
        );
    }

    #[test]
    fn environment_accepts_python_style_names() {
        assert_eq!(resolve_level(None, Some(" WARNING ")), tracing::Level::WARN);
        assert_eq!(resolve_level(None, Some("critical")), tracing::Level::ERROR);
    }

    #[test]
    fn only_compact_drops_source_location() {
        assert!(shows_location(LogFormat::Full));
        assert!(shows_location(LogFormat::Pretty));
        assert!(!shows_location(LogFormat::Compact));
    }

    #[test]
    fn defaults_to_warn() {
        assert_eq!(resolve_level(None, None), tracing::Level::WARN);
        assert_eq!(resolve_level(None, Some("loud")), tracing::Level::WARN);
    }
}
