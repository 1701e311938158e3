use serde::Deserialize;

/// What to do when a child process cannot be started at all (program not
/// found, permission denied).
///
/// - `Abort`: stop the run and report the error (default behaviour).
/// - `Continue`: log the failure, count it as exit code 127 and move on to
///   the next invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchFailurePolicy {
    #[default]
    Abort,
    Continue,
}

/// Exit code reported for an invocation whose program could not be launched.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 127;

/// Exit code of the whole run after Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
