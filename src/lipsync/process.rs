//! Bounded execution of external lip-sync tools.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Longest stderr excerpt kept for error messages.
const STDERR_TAIL_CHARS: usize = 400;

/// How a tool run ended.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Terminating signal (unix only).
    pub signal: Option<i32>,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum ToolError {
    /// The program could not be started.
    Spawn(std::io::Error),
    /// The deadline passed; the child has been killed.
    TimedOut,
    /// Waiting on the child failed.
    Wait(std::io::Error),
}

/// Run `program` with `args`, capturing stderr, killed after `limit`.
pub(crate) async fn run<I, S>(program: &Path, args: I, limit: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ToolError::Spawn)?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(ToolError::Wait)?,
        Err(_) => return Err(ToolError::TimedOut),
    };

    let status = output.status;
    debug!(program = %program.display(), ?status, "tool finished");
    Ok(ToolOutput {
        success: status.success(),
        code: status.code(),
        signal: exit_signal(&status),
        stderr: stderr_tail(&output.stderr),
    })
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Last [`STDERR_TAIL_CHARS`] characters of `raw`, trimmed.
pub(crate) fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_owned();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}
