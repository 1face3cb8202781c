//! Narrow subprocess seam around the external test runner.
//!
//! The serve loop and tool executor only ever see this trait, so tests can
//! substitute a recording double and assert on exact argv shapes without
//! spawning pytest.

use std::fmt;
use std::io::ErrorKind;
use std::process::Command;

#[derive(Debug, Clone)]
pub(crate) struct RunnerOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunnerError {
    /// The runner executable does not exist on PATH. Reported separately so
    /// callers can surface installation guidance.
    NotFound,
    Failed(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::NotFound => write!(formatter, "pytest executable not found on PATH"),
            RunnerError::Failed(detail) => write!(formatter, "{detail}"),
        }
    }
}

pub(crate) trait TestRunner {
    /// Runs `argv` to completion, capturing stdout, stderr, and exit status.
    /// The first token is the program name.
    fn run(&self, argv: &[String]) -> Result<RunnerOutput, RunnerError>;
}

pub(crate) struct PytestProcessRunner;

impl TestRunner for PytestProcessRunner {
    fn run(&self, argv: &[String]) -> Result<RunnerOutput, RunnerError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RunnerError::Failed("empty runner command".to_string()))?;
        let output = Command::new(program).args(args).output().map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                RunnerError::NotFound
            } else {
                RunnerError::Failed(error.to_string())
            }
        })?;
        Ok(RunnerOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
