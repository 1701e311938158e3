// src/exec/runner.rs

//! Sequential invocation runner.

use tracing::{error, info, warn};

use crate::errors::{BulkExecError, Result};
use crate::expand::ExpansionPlan;
use crate::types::{INTERRUPTED_EXIT_CODE, LaunchFailurePolicy};

use super::interrupt::Interrupt;
use super::launcher::Launcher;
use super::record::CsvRecorder;
use super::{InvocationOutcome, LaunchReport, LaunchRequest};

/// Tally of a finished (or interrupted) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Invocations attempted, including launch failures.
    pub attempted: usize,
    pub failed: usize,
    /// Exit code of the most recent failing invocation.
    pub last_failure: Option<i32>,
    pub interrupted: bool,
}

impl RunSummary {
    fn observe(&mut self, outcome: InvocationOutcome) {
        match outcome {
            InvocationOutcome::Success => {}
            InvocationOutcome::Failed(code) => {
                self.failed += 1;
                self.last_failure = Some(code);
            }
            InvocationOutcome::Interrupted => self.interrupted = true,
        }
    }

    /// 130 after an interrupt, otherwise the last non-zero child code, or 0.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            INTERRUPTED_EXIT_CODE
        } else {
            self.last_failure.unwrap_or(0)
        }
    }
}

/// Runs the invocations of a plan one after another.
pub struct Runner<L: Launcher> {
    launcher: L,
    policy: LaunchFailurePolicy,
    interrupt: Interrupt,
    recorder: Option<CsvRecorder>,
}

impl<L: Launcher> Runner<L> {
    pub fn new(launcher: L, policy: LaunchFailurePolicy, interrupt: Interrupt) -> Self {
        Self {
            launcher,
            policy,
            interrupt,
            recorder: None,
        }
    }

    /// Capture every child's output and record it.
    pub fn with_recorder(mut self, recorder: CsvRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub async fn run(&mut self, plan: &ExpansionPlan) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let capture = self.recorder.is_some();

        for invocation in plan.invocations() {
            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                break;
            }

            info!(
                index = invocation.index,
                program = %invocation.program(),
                "launching invocation"
            );
            let request = LaunchRequest {
                index: invocation.index,
                argv: invocation.argv.clone(),
                capture,
            };

            let report = match self.launcher.launch(request).await {
                Ok(report) => report,
                Err(BulkExecError::LaunchError { program, source })
                    if self.policy == LaunchFailurePolicy::Continue =>
                {
                    error!(
                        index = invocation.index,
                        program = %program,
                        error = %source,
                        "failed to launch; continuing"
                    );
                    LaunchReport::launch_failed(capture)
                }
                Err(err) => return Err(err),
            };

            summary.attempted += 1;
            summary.observe(report.outcome);

            if report.outcome == InvocationOutcome::Interrupted {
                warn!(index = invocation.index, "run interrupted");
                break;
            }
            if let InvocationOutcome::Failed(code) = report.outcome {
                warn!(index = invocation.index, exit_code = code, "invocation failed");
            }

            if let Some(recorder) = self.recorder.as_mut() {
                let captured = report.captured.unwrap_or_default();
                recorder.record(&invocation.argv, &captured, report.outcome.exit_code())?;
            }
        }

        if let Some(recorder) = self.recorder.take() {
            recorder.finish()?;
        }
        info!(
            attempted = summary.attempted,
            failed = summary.failed,
            exit_code = summary.exit_code(),
            "run finished"
        );
        Ok(summary)
    }
}
