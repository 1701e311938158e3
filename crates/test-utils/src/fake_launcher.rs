use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bulkexec::errors::{BulkExecError, Result};
use bulkexec::exec::{
    CapturedOutput, InterruptHandle, InvocationOutcome, LaunchReport, LaunchRequest, Launcher,
};

/// What the fake should do for one invocation index.
#[derive(Debug, Clone)]
pub enum Scripted {
    Exit(i32),
    /// Exit with `code` after "printing" the given output.
    Output {
        stdout: String,
        stderr: String,
        code: i32,
    },
    /// Behave as if the program does not exist.
    LaunchFailure,
    /// Trigger the run-wide interrupt and report the child as killed.
    Interrupt,
}

/// A fake launcher that:
/// - records every request it receives
/// - returns scripted outcomes per invocation index (exit 0 by default)
pub struct FakeLauncher {
    requests: Arc<Mutex<Vec<LaunchRequest>>>,
    script: HashMap<usize, Scripted>,
    interrupt: Option<InterruptHandle>,
}

impl FakeLauncher {
    pub fn new(requests: Arc<Mutex<Vec<LaunchRequest>>>) -> Self {
        Self {
            requests,
            script: HashMap::new(),
            interrupt: None,
        }
    }

    pub fn script(mut self, index: usize, behaviour: Scripted) -> Self {
        self.script.insert(index, behaviour);
        self
    }

    /// Handle fired by [`Scripted::Interrupt`].
    pub fn with_interrupt(mut self, handle: InterruptHandle) -> Self {
        self.interrupt = Some(handle);
        self
    }
}

impl Launcher for FakeLauncher {
    fn launch(
        &mut self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchReport>> + Send + '_>> {
        let behaviour = self
            .script
            .get(&request.index)
            .cloned()
            .unwrap_or(Scripted::Exit(0));
        let requests = Arc::clone(&self.requests);
        let interrupt = self.interrupt.as_ref();

        Box::pin(async move {
            let capture = request.capture;
            let program = request.argv.first().cloned().unwrap_or_default();
            requests.lock().unwrap().push(request);

            let captured = |stdout: &str, stderr: &str| {
                capture.then(|| CapturedOutput {
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                })
            };

            match behaviour {
                Scripted::Exit(code) => Ok(LaunchReport {
                    outcome: InvocationOutcome::from_code(code),
                    captured: captured("", ""),
                }),
                Scripted::Output {
                    stdout,
                    stderr,
                    code,
                } => Ok(LaunchReport {
                    outcome: InvocationOutcome::from_code(code),
                    captured: captured(&stdout, &stderr),
                }),
                Scripted::LaunchFailure => Err(BulkExecError::LaunchError {
                    program,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "No such file or directory",
                    ),
                }),
                Scripted::Interrupt => {
                    if let Some(handle) = interrupt {
                        handle.trigger();
                    }
                    Ok(LaunchReport {
                        outcome: InvocationOutcome::Interrupted,
                        captured: None,
                    })
                }
            }
        })
    }
}
