use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "pytest-mcp",
    about = "MCP stdio server exposing pytest execution tools",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "pytest-args",
        env = "PYTEST_ARGS",
        allow_hyphen_values = true,
        help = "Extra tokens appended to every pytest.runAll invocation (shell-style quoting honored)"
    )]
    pub pytest_args: Option<String>,

    #[arg(
        long = "report-file",
        env = "PYTEST_MCP_REPORT_FILE",
        default_value = "/tmp/pytest_report.json",
        help = "Machine-readable json-report path passed to pytest.runAll"
    )]
    pub report_file: PathBuf,

    #[arg(
        long = "log-file",
        env = "PYTEST_MCP_LOG_FILE",
        default_value = "/tmp/pytest_mcp_debug.log",
        help = "Append-only transcript log capturing every inbound request line"
    )]
    pub log_file: PathBuf,
}
