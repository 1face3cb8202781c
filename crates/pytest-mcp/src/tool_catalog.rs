//! Fixed tool catalog and synchronous tool executor.
//!
//! The catalog is immutable after startup. Tool-level failures never cross
//! the protocol boundary as errors; they become error-flagged `ToolResult`
//! payloads the caller inspects via `isError`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::test_runner::{RunnerError, TestRunner};

pub(crate) const TOOL_PYTEST_RUN_ALL: &str = "pytest.runAll";
pub(crate) const TOOL_PYTEST_RUN_FILE: &str = "pytest.runFile";
const PYTEST_PROGRAM: &str = "pytest";
const JSON_REPORT_FLAG: &str = "--json-report";
const JSON_REPORT_FILE_FLAG: &str = "--json-report-file";
const CONTENT_TYPE_TEXT: &str = "text";
const RUN_ALL_CONFIRMATION: &str = "Pytest executed. See logs.";
const PYTEST_NOT_FOUND_GUIDANCE: &str =
    "Pytest not found. Please ensure it is installed (`pip install pytest`) and in your PATH.";

#[derive(Debug, Serialize)]
pub(crate) struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

/// Tool invocation payload. `content` is never empty; `isError` is omitted
/// entirely when false.
#[derive(Debug, Serialize)]
pub(crate) struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: CONTENT_TYPE_TEXT,
                text: message.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: CONTENT_TYPE_TEXT,
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// The fixed two-tool catalog, in the order `tools/list` reports it.
pub(crate) fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: TOOL_PYTEST_RUN_ALL,
            description: "Run all tests",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string" }
                }
            }),
        },
        ToolDescriptor {
            name: TOOL_PYTEST_RUN_FILE,
            description: "Run tests in file",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                },
                "required": ["path"]
            }),
        },
    ]
}

/// Splits the environment-sourced `PYTEST_ARGS` value into argv tokens.
pub(crate) fn parse_extra_pytest_args(raw: &str) -> Result<Vec<String>> {
    shell_words::split(raw)
        .with_context(|| format!("failed to parse extra pytest arguments '{raw}'"))
}

pub(crate) struct ToolExecutor {
    runner: Box<dyn TestRunner>,
    extra_args: Vec<String>,
    report_file: PathBuf,
}

impl ToolExecutor {
    pub fn new(runner: Box<dyn TestRunner>, extra_args: Vec<String>, report_file: PathBuf) -> Self {
        Self {
            runner,
            extra_args,
            report_file,
        }
    }

    pub fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult {
        match name {
            TOOL_PYTEST_RUN_ALL => self.run_all(arguments),
            TOOL_PYTEST_RUN_FILE => self.run_file(arguments),
            other => ToolResult::error(format!("Unknown tool {other}")),
        }
    }

    fn run_all(&self, arguments: &Map<String, Value>) -> ToolResult {
        let mut argv = vec![
            PYTEST_PROGRAM.to_string(),
            JSON_REPORT_FLAG.to_string(),
            format!("{JSON_REPORT_FILE_FLAG}={}", self.report_file.display()),
        ];
        argv.extend(self.extra_args.iter().cloned());
        if let Some(directory) = arguments.get("directory").and_then(Value::as_str) {
            argv.push(directory.to_string());
        }
        match self.runner.run(&argv) {
            Ok(output) => {
                // Outcome detail stays in the json report and logs; callers
                // get a fixed confirmation only.
                tracing::debug!(exit_code = ?output.exit_code, "pytest.runAll completed");
                ToolResult::text(RUN_ALL_CONFIRMATION)
            }
            Err(RunnerError::NotFound) => ToolResult::error(PYTEST_NOT_FOUND_GUIDANCE),
            Err(RunnerError::Failed(detail)) => ToolResult::error(detail),
        }
    }

    fn run_file(&self, arguments: &Map<String, Value>) -> ToolResult {
        let Some(path) = arguments
            .get("path")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
        else {
            return ToolResult::error("path required");
        };
        let argv = vec![PYTEST_PROGRAM.to_string(), path.to_string()];
        match self.runner.run(&argv) {
            Ok(output) => {
                // A non-zero exit is informational content for the caller,
                // not a tool error.
                tracing::debug!(exit_code = ?output.exit_code, "pytest.runFile completed");
                ToolResult::text(format!("{}\n{}", output.stdout, output.stderr))
            }
            Err(error) => ToolResult::error(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{json, Map, Value};

    use super::{parse_extra_pytest_args, tool_descriptors, ToolExecutor};
    use crate::test_runner::{doubles::RecordingRunner, RunnerError};

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().expect("arguments object").clone()
    }

    fn executor(runner: &RecordingRunner, extra_args: Vec<String>) -> ToolExecutor {
        ToolExecutor::new(
            Box::new(runner.clone()),
            extra_args,
            PathBuf::from("/tmp/pytest_report.json"),
        )
    }

    #[test]
    fn unit_tool_descriptors_fixed_order_and_schemas() {
        let descriptors = tool_descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "pytest.runAll");
        assert_eq!(descriptors[1].name, "pytest.runFile");
        assert!(descriptors[0].input_schema["properties"]["directory"].is_object());
        assert_eq!(descriptors[1].input_schema["required"], json!(["path"]));
    }

    #[test]
    fn unit_parse_extra_pytest_args_honors_shell_quoting() {
        assert_eq!(
            parse_extra_pytest_args("-vv -k \"a and b\"").expect("split"),
            vec!["-vv".to_string(), "-k".to_string(), "a and b".to_string()]
        );
        assert!(parse_extra_pytest_args("").expect("empty split").is_empty());
        assert!(parse_extra_pytest_args("-k \"unterminated").is_err());
    }

    #[test]
    fn functional_invoke_unknown_tool_reports_error_with_name() {
        let runner = RecordingRunner::with_output("", "", 0);
        let result = executor(&runner, Vec::new()).invoke("pytest.bogus", &Map::new());
        assert!(result.is_error);
        assert!(result.content[0].text.contains("Unknown tool pytest.bogus"));
        assert!(runner.recorded_calls().is_empty());
    }

    #[test]
    fn functional_run_file_without_path_skips_runner() {
        let runner = RecordingRunner::with_output("", "", 0);
        let result = executor(&runner, Vec::new()).invoke("pytest.runFile", &Map::new());
        assert!(result.is_error);
        assert_eq!(result.content[0].text, "path required");
        assert!(runner.recorded_calls().is_empty());
    }

    #[test]
    fn functional_run_file_invokes_pytest_with_exact_path() {
        let runner = RecordingRunner::with_output("1 passed\n", "", 0);
        let result = executor(&runner, Vec::new()).invoke(
            "pytest.runFile",
            &arguments(json!({"path": "tests/test_foo.py"})),
        );
        assert!(!result.is_error);
        assert_eq!(
            runner.recorded_calls(),
            vec![vec!["pytest".to_string(), "tests/test_foo.py".to_string()]]
        );
    }

    #[test]
    fn functional_run_all_builds_report_argv_with_extra_args_and_directory() {
        let runner = RecordingRunner::with_output("", "", 0);
        let result = executor(&runner, vec!["-vv".to_string(), "-x".to_string()]).invoke(
            "pytest.runAll",
            &arguments(json!({"directory": "tests/unit"})),
        );
        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "Pytest executed. See logs.");
        assert_eq!(
            runner.recorded_calls(),
            vec![vec![
                "pytest".to_string(),
                "--json-report".to_string(),
                "--json-report-file=/tmp/pytest_report.json".to_string(),
                "-vv".to_string(),
                "-x".to_string(),
                "tests/unit".to_string(),
            ]]
        );
    }

    #[test]
    fn functional_run_all_without_configuration_still_requests_report() {
        let runner = RecordingRunner::with_output("", "", 0);
        executor(&runner, Vec::new()).invoke("pytest.runAll", &Map::new());
        let calls = runner.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&"--json-report".to_string()));
    }

    #[test]
    fn regression_run_all_missing_executable_returns_install_guidance() {
        let runner = RecordingRunner::with_outcome(Err(RunnerError::NotFound));
        let result = executor(&runner, Vec::new()).invoke("pytest.runAll", &Map::new());
        assert!(result.is_error);
        assert!(result.content[0].text.contains("pip install pytest"));
    }

    #[test]
    fn regression_run_file_nonzero_exit_is_not_an_error() {
        let runner = RecordingRunner::with_output("1 failed\n", "assertion detail\n", 1);
        let result = executor(&runner, Vec::new())
            .invoke("pytest.runFile", &arguments(json!({"path": "t.py"})));
        assert!(!result.is_error);
        assert_eq!(result.content[0].text, "1 failed\n\nassertion detail\n");
    }

    #[test]
    fn regression_run_file_spawn_failure_reports_description() {
        let runner = RecordingRunner::with_outcome(Err(RunnerError::Failed(
            "permission denied".to_string(),
        )));
        let result = executor(&runner, Vec::new())
            .invoke("pytest.runFile", &arguments(json!({"path": "t.py"})));
        assert!(result.is_error);
        assert!(result.content[0].text.contains("permission denied"));
    }
}
