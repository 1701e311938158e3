// src/exec/launcher.rs

//! Pluggable launcher abstraction.
//!
//! The runner talks to a `Launcher` instead of spawning processes itself, so
//! tests can replace it with a fake that records argument lists and returns
//! scripted outcomes.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{BulkExecError, Result};

use super::interrupt::Interrupt;
use super::{CapturedOutput, InvocationOutcome, LaunchReport, LaunchRequest};

/// Trait abstracting how one invocation is executed.
///
/// Production code uses [`ProcessLauncher`]. A program that cannot be
/// started must be reported as [`BulkExecError::LaunchError`] so the runner
/// can apply the launch failure policy.
pub trait Launcher: Send {
    fn launch(
        &mut self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchReport>> + Send + '_>>;
}

/// Real launcher: one child process per request, awaited to completion.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    shell: bool,
    interrupt: Interrupt,
}

impl ProcessLauncher {
    pub fn new(shell: bool, interrupt: Interrupt) -> Self {
        Self { shell, interrupt }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &mut self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchReport>> + Send + '_>> {
        let shell = self.shell;
        let mut interrupt = self.interrupt.clone();
        Box::pin(async move { run_child(request, shell, &mut interrupt).await })
    }
}

/// Build the command for `argv`, optionally through the platform shell.
pub fn build_command(argv: &[String], shell: bool) -> Result<Command> {
    let (program, args) = argv.split_first().ok_or(BulkExecError::EmptyCommand)?;
    let cmd = if shell {
        let line = shell_words::join(argv);
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(line);
            c
        }
    } else {
        let mut c = Command::new(program);
        c.args(args);
        c
    };
    Ok(cmd)
}

fn spawn_reader<R>(reader: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    reader.map(|mut reader| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok(buf)
        })
    })
}

async fn collect(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };
    let bytes = handle
        .await
        .context("output reader task panicked")?
        .context("reading child output")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn run_child(
    request: LaunchRequest,
    shell: bool,
    interrupt: &mut Interrupt,
) -> Result<LaunchReport> {
    let mut cmd = build_command(&request.argv, shell)?;
    let program = request.argv.first().cloned().unwrap_or_default();

    if request.capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    cmd.stdin(Stdio::inherit()).kill_on_drop(true);

    debug!(index = request.index, argv = ?request.argv, shell, "spawning child");
    let mut child = cmd.spawn().map_err(|source| BulkExecError::LaunchError {
        program: program.clone(),
        source,
    })?;

    // Drain both pipes while waiting so a chatty child cannot block on a
    // full buffer.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    tokio::select! {
        status = child.wait() => {
            let status = status
                .with_context(|| format!("waiting for invocation {} ('{program}')", request.index))?;
            let code = status.code().unwrap_or(1);
            info!(index = request.index, program = %program, exit_code = code, "invocation exited");

            let captured = if request.capture {
                let captured = CapturedOutput {
                    stdout: collect(stdout).await?,
                    stderr: collect(stderr).await?,
                };
                echo_captured(request.index, code, &captured).await?;
                Some(captured)
            } else {
                None
            };

            Ok(LaunchReport {
                outcome: InvocationOutcome::from_code(code),
                captured,
            })
        }

        true = interrupt.triggered() => {
            info!(index = request.index, program = %program, "interrupted; killing child");
            if let Err(e) = child.kill().await {
                warn!(index = request.index, error = %e, "failed to kill child process");
            }
            Ok(LaunchReport {
                outcome: InvocationOutcome::Interrupted,
                captured: None,
            })
        }
    }
}

/// Captured stdout still reaches the terminal; stderr goes to the log.
async fn echo_captured(index: usize, code: i32, captured: &CapturedOutput) -> Result<()> {
    let mut out = tokio::io::stdout();
    out.write_all(captured.stdout.as_bytes()).await?;
    out.flush().await?;
    if !captured.stderr.is_empty() {
        error!(index, exit_code = code, "stderr: {}", captured.stderr.trim_end());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shell_mode_quotes_arguments() {
        let cmd = build_command(&argv(&["echo", "a b", "it's"]), true).unwrap();
        let std_cmd = cmd.as_std();
        if cfg!(windows) {
            assert_eq!(std_cmd.get_program(), "cmd");
        } else {
            assert_eq!(std_cmd.get_program(), "sh");
            let args: Vec<_> = std_cmd.get_args().collect();
            assert_eq!(args, ["-c", r#"echo 'a b' 'it'\''s'"#]);
        }
    }

    #[test]
    fn direct_mode_passes_argv_through() {
        let cmd = build_command(&argv(&["ls", "-l", "a b"]), false).unwrap();
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "ls");
        assert_eq!(std_cmd.get_args().collect::<Vec<_>>(), ["-l", "a b"]);
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(matches!(
            build_command(&[], false),
            Err(BulkExecError::EmptyCommand)
        ));
    }
}
