//! Subprocess runner for the engine CLI and the GPU probe.
//!
//! Children are spawned with `kill_on_drop`, so a timeout or a dropped
//! request future terminates the process instead of leaving it running.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use docscan_core::EngineError;
use tokio::process::Command;
use tracing::{debug, warn};

/// Bytes of stderr kept for error messages.
const STDERR_TAIL_BYTES: usize = 2_000;

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few lines of stderr, for logs and error messages.
    pub fn stderr_tail(&self) -> &str {
        let trimmed = self.stderr.trim_end();
        if trimmed.len() <= STDERR_TAIL_BYTES {
            return trimmed;
        }
        let mut start = trimmed.len() - STDERR_TAIL_BYTES;
        while !trimmed.is_char_boundary(start) {
            start += 1;
        }
        &trimmed[start..]
    }
}

/// Run `program args...` to completion, killing it after `timeout`.
///
/// Spawn failures are returned as [`EngineError::Io`] so callers can tell a
/// missing executable (`NotFound`) apart from a process that ran and failed.
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<ExecOutput, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, "Spawning engine subprocess");
    let child = cmd.spawn()?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(program, timeout_secs = timeout.as_secs(), "Subprocess timed out; killed");
            return Err(EngineError::Timeout(timeout));
        }
    };

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = run_command("sh", ["-c", "echo hello; exit 3"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = run_command("docscan-no-such-binary", ["--version"], Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            EngineError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let err = run_command("sh", ["-c", "sleep 5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let out = ExecOutput {
            stdout: String::new(),
            stderr: "x".repeat(10_000),
            exit_code: 1,
        };
        assert_eq!(out.stderr_tail().len(), STDERR_TAIL_BYTES);
    }
}
