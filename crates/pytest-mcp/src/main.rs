//! Stdio MCP server exposing pytest execution tools.
//!
//! Reads newline-delimited JSON-RPC requests from stdin, dispatches
//! initialize/tools handshakes and tool invocations, and writes one JSON
//! response line per request id. Diagnostics go to stderr and to an
//! append-only transcript log so stdout stays pure protocol.

mod bootstrap_helpers;
mod cli_args;
mod server_runtime;
mod test_runner;
mod tool_catalog;
mod transcript_log;

use std::io::{self, BufReader};

use anyhow::Result;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;
use crate::server_runtime::{serve_jsonrpc_reader, ServerState};
use crate::test_runner::PytestProcessRunner;
use crate::tool_catalog::{parse_extra_pytest_args, ToolExecutor};
use crate::transcript_log::TranscriptLog;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let extra_args = match cli.pytest_args.as_deref() {
        Some(raw) => parse_extra_pytest_args(raw)?,
        None => Vec::new(),
    };
    let state = ServerState {
        executor: ToolExecutor::new(
            Box::new(PytestProcessRunner),
            extra_args,
            cli.report_file.clone(),
        ),
        transcript: TranscriptLog::new(cli.log_file.clone()),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();
    let report = serve_jsonrpc_reader(&mut reader, &mut writer, &state)?;
    tracing::info!(
        processed_lines = report.processed_lines,
        responses_written = report.responses_written,
        error_count = report.error_count,
        "pytest-mcp session ended"
    );
    Ok(())
}
