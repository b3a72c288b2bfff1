use std::fmt;
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::config::ExampleConfig;

/// Reported when a function has no example code to run
pub const NO_EXAMPLE: &str = "No example to test.";

/// Outcome of executing one example snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExampleOutcome {
    /// Exited cleanly; holds everything written to stdout
    Success(String),

    /// Raised, exited non-zero, or could not be started
    Failure(String),
}

impl fmt::Display for ExampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExampleOutcome::Success(output) => write!(f, "Success. Output:\n{}", output),
            ExampleOutcome::Failure(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Executes docstring examples in a fresh Python interpreter.
///
/// Each snippet runs in its own `python -I -c` process: an empty namespace
/// with no access to the documented module, the caller's environment, or
/// user site-packages. This is output capture and failure containment only.
/// It is NOT a security sandbox: there are no time limits, no resource
/// limits, and nothing stops a snippet from touching the filesystem or the
/// network. Never feed it untrusted code.
pub struct ExampleRunner {
    interpreter: String,
    exception_line: Regex,
}

impl ExampleRunner {
    pub fn new(config: &ExampleConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            exception_line: Regex::new(r"^[A-Za-z_][\w.]*: (.*)$")
                .expect("Invalid exception line regex"),
        }
    }

    /// Run `code` and report what happened; never fails
    pub async fn run(&self, code: &str) -> ExampleOutcome {
        debug!("Running example with {}", self.interpreter);

        let output = Command::new(&self.interpreter)
            .arg("-I")
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return ExampleOutcome::Failure(format!(
                    "failed to launch interpreter {}: {}",
                    self.interpreter, e
                ))
            }
        };

        if output.status.success() {
            ExampleOutcome::Success(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            ExampleOutcome::Failure(self.failure_message(&stderr, output.status))
        }
    }

    /// Report line for an optional example, distinguishing "not attempted"
    pub async fn test_example(&self, code: Option<&str>) -> String {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => self.run(code).await.to_string(),
            None => NO_EXAMPLE.to_string(),
        }
    }

    /// The exception message from the last traceback line
    fn failure_message(&self, stderr: &str, status: std::process::ExitStatus) -> String {
        match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
            Some(last) => match self.exception_line.captures(last) {
                Some(caps) => caps[1].to_string(),
                None => last.to_string(),
            },
            None => format!("example exited with {}", status),
        }
    }
}

impl Default for ExampleRunner {
    fn default() -> Self {
        Self::new(&ExampleConfig::default())
    }
}
