// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] provides the `Launcher` trait and the real
//!   `ProcessLauncher` built on `tokio::process::Command`. Tests swap in a
//!   fake launcher that never spawns anything.
//! - [`runner`] walks an expansion plan one invocation at a time and
//!   computes the run's exit status.
//! - [`record`] writes captured results to CSV.
//! - [`interrupt`] carries Ctrl-C to both of them.

pub mod interrupt;
pub mod launcher;
pub mod record;
pub mod runner;

pub use interrupt::{Interrupt, InterruptHandle};
pub use launcher::{Launcher, ProcessLauncher};
pub use record::CsvRecorder;
pub use runner::{RunSummary, Runner};

use crate::types::{INTERRUPTED_EXIT_CODE, LAUNCH_FAILURE_EXIT_CODE};

/// Everything a launcher needs to start one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub index: usize,
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Pipe and collect stdout/stderr instead of inheriting them.
    pub capture: bool,
}

/// How one invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success,
    /// Non-zero exit code; 1 when killed by a signal.
    Failed(i32),
    /// Killed because the run was interrupted.
    Interrupted,
}

impl InvocationOutcome {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            InvocationOutcome::Success
        } else {
            InvocationOutcome::Failed(code)
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            InvocationOutcome::Success => 0,
            InvocationOutcome::Failed(code) => code,
            InvocationOutcome::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}

/// Output collected from a captured child, decoded lossily as UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub outcome: InvocationOutcome,
    /// Present when the request asked for capture and the child finished.
    pub captured: Option<CapturedOutput>,
}

impl LaunchReport {
    /// Stand-in report for a program that could not be started.
    pub fn launch_failed(capture: bool) -> Self {
        Self {
            outcome: InvocationOutcome::Failed(LAUNCH_FAILURE_EXIT_CODE),
            captured: capture.then(CapturedOutput::default),
        }
    }
}
