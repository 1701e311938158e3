// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod expand;
pub mod expr;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, Settings, load_and_validate};
use crate::exec::{CsvRecorder, Interrupt, ProcessLauncher, Runner};
use crate::expand::ExpansionPlan;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading and CLI overrides
/// - argument expansion
/// - the sequential runner with the real process launcher
/// - CSV recording
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let config: Option<ConfigFile> = match &args.config {
        Some(path) => Some(
            load_and_validate(path)
                .with_context(|| format!("loading config {}", path.display()))?,
        ),
        None => None,
    };
    let settings = Settings::resolve(&args, config.as_ref());
    debug!(?settings, "resolved settings");

    let plan = ExpansionPlan::build(&args.command, &settings.limits)?;
    info!(
        invocations = plan.invocation_count(),
        "expanded command line"
    );

    if settings.dry_run {
        print_dry_run(&plan);
        return Ok(0);
    }

    // Ctrl-C → stop launching and kill the running child.
    let (handle, interrupt) = Interrupt::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        handle.trigger();
    });

    let launcher = ProcessLauncher::new(settings.shell, interrupt.clone());
    let mut runner = Runner::new(launcher, settings.on_launch_failure, interrupt);
    if let Some(path) = &settings.output {
        let recorder = CsvRecorder::create(path, plan.tokens())
            .with_context(|| format!("creating output file {}", path.display()))?;
        runner = runner.with_recorder(recorder);
    }

    let summary = runner.run(&plan).await?;
    Ok(summary.exit_code())
}

/// One shell-quoted line per invocation.
pub fn dry_run_lines(plan: &ExpansionPlan) -> Vec<String> {
    plan.invocations()
        .map(|inv| shell_words::join(&inv.argv))
        .collect()
}

fn print_dry_run(plan: &ExpansionPlan) {
    for line in dry_run_lines(plan) {
        println!("{line}");
    }
}
