//! Timeout-bounded subprocess execution.
//!
//! Every external tool invocation goes through [`run`], which enforces a
//! wall-clock deadline and maps failures into the execution error taxonomy
//! by inspecting stderr.

use convergence::ExecutionError;
use log::debug;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Captured output of a finished subprocess.
#[derive(Debug)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a command to completion with a deadline. The child is killed when
/// the deadline passes; partial output is discarded.
pub fn run(mut cmd: Command, timeout: Duration) -> Result<CmdOutput, ExecutionError> {
    debug!("running {cmd:?} (timeout {timeout:?})");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecutionError::from_io(&format!("failed to spawn {cmd:?}"), &e))?;

    // Drain pipes on background threads so a chatty child cannot block on
    // a full pipe while we poll for exit.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_thread = thread::spawn(move || read_pipe(stdout));
    let stderr_thread = thread::spawn(move || read_pipe(stderr));

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout_thread.join().unwrap_or_default();
                let stderr = stderr_thread.join().unwrap_or_default();
                return Ok(CmdOutput {
                    stdout,
                    stderr,
                    code: status.code(),
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_thread.join();
                    let _ = stderr_thread.join();
                    return Err(ExecutionError::Timeout {
                        seconds: timeout.as_secs(),
                    });
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(ExecutionError::from_io("failed to wait for child", &e));
            }
        }
    }
}

/// Run a command and classify a non-zero exit into the error taxonomy.
pub fn run_checked(
    cmd: Command,
    what: &str,
    timeout: Duration,
) -> Result<CmdOutput, ExecutionError> {
    let output = run(cmd, timeout)?;
    if output.success() {
        Ok(output)
    } else {
        Err(classify(what, &output))
    }
}

/// Categorize a failed command by its stderr.
///
/// Network failures are the only transient class; permission failures get
/// their own variant so callers can point at sudo; everything else keeps
/// the exit code and stderr verbatim.
pub fn classify(what: &str, output: &CmdOutput) -> ExecutionError {
    let stderr = output.stderr.trim();
    let lower = stderr.to_lowercase();

    if lower.contains("could not resolve")
        || lower.contains("temporary failure resolving")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("failed to fetch")
        || lower.contains("timed out")
    {
        return ExecutionError::NetworkUnavailable {
            message: stderr.to_string(),
        };
    }

    if lower.contains("permission denied")
        || lower.contains("operation not permitted")
        || lower.contains("are you root")
        || lower.contains("access denied")
    {
        return ExecutionError::PermissionDenied {
            message: stderr.to_string(),
        };
    }

    ExecutionError::Unknown {
        message: format!("{what} failed"),
        code: output.code,
        stderr: stderr.to_string(),
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> CmdOutput {
        CmdOutput {
            stdout: String::new(),
            stderr: stderr.into(),
            code: Some(100),
        }
    }

    #[test]
    fn test_classify_network() {
        let err = classify(
            "apt-get install nginx",
            &failed("E: Failed to fetch http://archive.ubuntu.com ... Could not resolve host"),
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_permission() {
        let err = classify(
            "apt-get install nginx",
            &failed("E: Could not open lock file - open (13: Permission denied), are you root?"),
        );
        assert!(matches!(err, ExecutionError::PermissionDenied { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_unknown_keeps_code_and_stderr() {
        let err = classify(
            "apt-get install foo",
            &failed("E: Unable to locate package foo"),
        );
        match err {
            ExecutionError::Unknown { code, stderr, .. } => {
                assert_eq!(code, Some(100));
                assert!(stderr.contains("Unable to locate"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_run_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);
        let output = run(cmd, Duration::from_secs(5)).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_run_times_out() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 30"]);
        let err = run(cmd, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout { .. }));
    }

    #[test]
    fn test_run_checked_classifies_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo 'Permission denied' >&2; exit 1"]);
        let err = run_checked(cmd, "probe", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ExecutionError::PermissionDenied { .. }));
    }
}
