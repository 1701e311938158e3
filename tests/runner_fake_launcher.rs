// tests/runner_fake_launcher.rs

use bulkexec_test_utils::fake_launcher::{FakeLauncher, Scripted};
use bulkexec_test_utils::{init_tracing, tokens, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use bulkexec::errors::BulkExecError;
use bulkexec::exec::{CsvRecorder, Interrupt, LaunchRequest, Runner};
use bulkexec::expand::ExpansionPlan;
use bulkexec::expr::Limits;
use bulkexec::types::LaunchFailurePolicy;

type TestResult = Result<(), Box<dyn Error>>;

fn plan(raw: &[&str]) -> ExpansionPlan {
    ExpansionPlan::build(&tokens(raw), &Limits::default()).expect("plan should build")
}

fn launched(requests: &Arc<Mutex<Vec<LaunchRequest>>>) -> Vec<Vec<String>> {
    requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.argv.clone())
        .collect()
}

#[tokio::test]
async fn runs_every_invocation_in_order() -> TestResult {
    init_tracing();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone());
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, Interrupt::never());

    let summary = with_timeout(runner.run(&plan(&["echo", "range(3)", "'x'"]))).await?;

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.attempted, 3);
    assert_eq!(
        launched(&requests),
        vec![
            tokens(&["echo", "0", "x"]),
            tokens(&["echo", "1", "x"]),
            tokens(&["echo", "2", "x"]),
        ]
    );
    assert!(requests.lock().unwrap().iter().all(|r| !r.capture));
    Ok(())
}

#[tokio::test]
async fn exit_code_is_the_last_failure() -> TestResult {
    init_tracing();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone())
        .script(1, Scripted::Exit(3))
        .script(2, Scripted::Exit(2));
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, Interrupt::never());

    let summary = runner.run(&plan(&["job", "range(4)"])).await?;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.last_failure, Some(2));
    assert_eq!(summary.exit_code(), 2);
    assert_eq!(launched(&requests).len(), 4);
    Ok(())
}

#[tokio::test]
async fn launch_failure_aborts_by_default() {
    init_tracing();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone()).script(1, Scripted::LaunchFailure);
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, Interrupt::never());

    let result = runner.run(&plan(&["missing", "range(3)"])).await;

    match result {
        Err(BulkExecError::LaunchError { program, .. }) => assert_eq!(program, "missing"),
        other => panic!("expected a launch error, got {other:?}"),
    }
    assert_eq!(launched(&requests).len(), 2);
}

#[tokio::test]
async fn launch_failure_counts_as_127_when_continuing() -> TestResult {
    init_tracing();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone()).script(0, Scripted::LaunchFailure);
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Continue, Interrupt::never());

    let summary = runner.run(&plan(&["missing", "range(3)"])).await?;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exit_code(), 127);
    Ok(())
}

#[tokio::test]
async fn interrupt_stops_the_run_with_130() -> TestResult {
    init_tracing();

    let (handle, interrupt) = Interrupt::channel();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone())
        .script(1, Scripted::Interrupt)
        .with_interrupt(handle);
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, interrupt);

    let summary = runner.run(&plan(&["job", "range(5)"])).await?;

    assert!(summary.interrupted);
    assert_eq!(summary.exit_code(), 130);
    assert_eq!(launched(&requests).len(), 2);
    Ok(())
}

#[tokio::test]
async fn pending_interrupt_launches_nothing() -> TestResult {
    let (handle, interrupt) = Interrupt::channel();
    handle.trigger();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let mut runner = Runner::new(
        FakeLauncher::new(requests.clone()),
        LaunchFailurePolicy::Abort,
        interrupt,
    );

    let summary = runner.run(&plan(&["job", "range(5)"])).await?;

    assert_eq!(summary.exit_code(), 130);
    assert!(launched(&requests).is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_plan_runs_nothing_and_succeeds() -> TestResult {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let mut runner = Runner::new(
        FakeLauncher::new(requests.clone()),
        LaunchFailurePolicy::Abort,
        Interrupt::never(),
    );

    let summary = runner.run(&plan(&["echo", "[]"])).await?;

    assert_eq!(summary.exit_code(), 0);
    assert!(launched(&requests).is_empty());
    Ok(())
}

#[tokio::test]
async fn recorder_writes_header_and_rows() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("results.csv");
    let plan = plan(&["echo", "['a', 'b']", "range(3)"]);

    let requests = Arc::new(Mutex::new(Vec::new()));
    let launcher = FakeLauncher::new(requests.clone())
        .script(
            0,
            Scripted::Output {
                stdout: "hello, world\n".to_string(),
                stderr: String::new(),
                code: 0,
            },
        )
        .script(
            2,
            Scripted::Output {
                stdout: String::new(),
                stderr: "boom".to_string(),
                code: 4,
            },
        );
    let mut runner = Runner::new(launcher, LaunchFailurePolicy::Abort, Interrupt::never())
        .with_recorder(CsvRecorder::create(&path, plan.tokens())?);

    let summary = runner.run(&plan).await?;
    assert_eq!(summary.exit_code(), 4);
    assert!(requests.lock().unwrap().iter().all(|r| r.capture));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.map(|rec| rec.iter().map(String::from).collect()))
        .collect::<Result<_, _>>()?;

    assert_eq!(
        rows,
        vec![
            tokens(&["echo", "['a', 'b']", "range(3)", "stdout", "stderr", "returncode"]),
            tokens(&["echo", "a", "0", "hello, world\n", "", "0"]),
            tokens(&["echo", "b", "1", "", "", "0"]),
            tokens(&["echo", "a", "2", "", "boom", "4"]),
        ]
    );
    Ok(())
}
