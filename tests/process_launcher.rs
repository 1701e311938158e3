// tests/process_launcher.rs
//
// Spawns real processes through `sh`, so these only run on Unix.
#![cfg(unix)]

use bulkexec_test_utils::{init_tracing, tokens, with_timeout};

use std::error::Error;
use std::time::Duration;

use bulkexec::errors::BulkExecError;
use bulkexec::exec::{
    CapturedOutput, Interrupt, InvocationOutcome, LaunchRequest, Launcher, ProcessLauncher, Runner,
};
use bulkexec::expand::ExpansionPlan;
use bulkexec::expr::Limits;
use bulkexec::types::LaunchFailurePolicy;

type TestResult = Result<(), Box<dyn Error>>;

fn request(argv: &[&str], capture: bool) -> LaunchRequest {
    LaunchRequest {
        index: 0,
        argv: tokens(argv),
        capture,
    }
}

#[tokio::test]
async fn captures_output_and_exit_code() -> TestResult {
    init_tracing();

    let mut launcher = ProcessLauncher::new(false, Interrupt::never());
    let report = with_timeout(launcher.launch(request(
        &["sh", "-c", "echo out; echo err >&2; exit 3"],
        true,
    )))
    .await?;

    assert_eq!(report.outcome, InvocationOutcome::Failed(3));
    assert_eq!(
        report.captured,
        Some(CapturedOutput {
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
        })
    );
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_launch_error() {
    let mut launcher = ProcessLauncher::new(false, Interrupt::never());
    let result = launcher
        .launch(request(&["bulkexec-no-such-program-here"], false))
        .await;

    match result {
        Err(BulkExecError::LaunchError { program, .. }) => {
            assert_eq!(program, "bulkexec-no-such-program-here")
        }
        other => panic!("expected a launch error, got {other:?}"),
    }
}

#[tokio::test]
async fn shell_mode_keeps_arguments_intact() -> TestResult {
    let mut launcher = ProcessLauncher::new(true, Interrupt::never());
    let report = with_timeout(launcher.launch(request(&["printf", "%s|", "a b", "c"], true))).await?;

    assert_eq!(report.outcome, InvocationOutcome::Success);
    assert_eq!(
        report.captured.map(|c| c.stdout),
        Some("a b|c|".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn interrupt_kills_the_running_child() -> TestResult {
    init_tracing();

    let (handle, interrupt) = Interrupt::channel();
    let mut launcher = ProcessLauncher::new(false, interrupt);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.trigger();
    });

    let report = with_timeout(launcher.launch(request(&["sleep", "30"], false))).await?;
    assert_eq!(report.outcome, InvocationOutcome::Interrupted);
    assert_eq!(report.captured, None);
    Ok(())
}

#[tokio::test]
async fn runner_reports_the_last_failing_code() -> TestResult {
    init_tracing();

    let plan = ExpansionPlan::build(
        &tokens(&["sh", "-c", "[f'exit {i}' for i in range(3)]"]),
        &Limits::default(),
    )?;
    let launcher = ProcessLauncher::new(false, Interrupt::never());
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, Interrupt::never());

    let summary = with_timeout(runner.run(&plan)).await?;
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.exit_code(), 2);
    Ok(())
}
