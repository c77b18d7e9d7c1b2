//! Subprocess plumbing for tool-wrapping strategies
//!
//! Strategies that shell out (rustfmt today) go through [`run_tool`], which
//! enforces a per-invocation timeout: the child is polled and killed once
//! the deadline passes, so a hung tool costs one sub-task its findings
//! instead of stalling the whole run. Output pipes are drained on separate
//! threads to keep a chatty tool from deadlocking against a full pipe
//! buffer.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Poll interval while waiting on a child process.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Whether the tool ran to completion (it may still have reported
    /// findings through a nonzero exit code)
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl ToolOutput {
    fn completed(stdout: String, stderr: String, exit_code: Option<i32>) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            exit_code,
            timed_out: false,
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            timed_out: false,
            error: Some(error),
        }
    }

    fn timeout(program: &str, limit: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            timed_out: true,
            error: Some(format!(
                "{program} timed out after {}s",
                limit.as_secs()
            )),
        }
    }
}

fn drain(stream: Option<impl Read + Send + 'static>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_string(&mut buf);
        }
        buf
    })
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> std::io::Result<Option<i32>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run `program args..` with a hard timeout, capturing stdout/stderr.
///
/// A missing binary degrades to a failure result; it never propagates as an
/// error, because a tool-wrapping strategy must yield empty summaries when
/// its tool is unavailable.
pub fn run_tool(program: &str, args: &[&str], cwd: Option<&Path>, limit: Duration) -> ToolOutput {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!("{program} unavailable: {e}");
            return ToolOutput::failure(format!("{program} unavailable: {e}"));
        }
    };

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    match wait_with_timeout(&mut child, limit) {
        Ok(Some(code)) => {
            let stdout = stdout.join().unwrap_or_default();
            let stderr = stderr.join().unwrap_or_default();
            ToolOutput::completed(stdout, stderr, Some(code))
        }
        Ok(None) => {
            warn!("{program} exceeded {}s, killing", limit.as_secs());
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout.join();
            let _ = stderr.join();
            ToolOutput::timeout(program, limit)
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            ToolOutput::failure(format!("{program} wait failed: {e}"))
        }
    }
}

/// Cheap availability probe: `program --version` exits cleanly.
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_degrades() {
        let out = run_tool(
            "definitely-not-a-real-binary-7f3a",
            &[],
            None,
            Duration::from_secs(5),
        );
        assert!(!out.success);
        assert!(!out.timed_out);
        assert!(out.error.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let out = run_tool("echo", &["hello"], None, Duration::from_secs(5));
        assert!(out.success);
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_tool() {
        let start = Instant::now();
        let out = run_tool("sleep", &["30"], None, Duration::from_millis(200));
        assert!(out.timed_out);
        assert!(!out.success);
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "kill path took too long"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_available() {
        assert!(tool_available("sh") || tool_available("echo"));
        assert!(!tool_available("definitely-not-a-real-binary-7f3a"));
    }
}
