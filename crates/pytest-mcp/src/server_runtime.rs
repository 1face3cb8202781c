//! Newline-delimited JSON-RPC serve loop and request dispatcher.
//!
//! Generic over `BufRead`/`Write` so tests drive it with in-memory cursors.
//! One request is handled to completion before the next line is read; there
//! is no concurrency and no shared mutable state beyond the transcript log.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

use crate::tool_catalog::{self, ToolExecutor};
use crate::transcript_log::TranscriptLog;

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "pytest-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) struct ServerState {
    pub executor: ToolExecutor,
    pub transcript: TranscriptLog,
}

#[derive(Debug, Clone)]
pub(crate) struct ServeReport {
    pub processed_lines: usize,
    pub responses_written: usize,
    pub error_count: usize,
}

/// Serves requests until EOF or an unrecoverable transport error.
///
/// Malformed lines are fatal to the session: they are logged and counted,
/// no response is produced for them, and the loop exits. Tool-level
/// failures never end the session.
pub(crate) fn serve_jsonrpc_reader<R, W>(
    reader: &mut R,
    writer: &mut W,
    state: &ServerState,
) -> Result<ServeReport>
where
    R: BufRead,
    W: Write,
{
    let mut processed_lines = 0usize;
    let mut responses_written = 0usize;
    let mut error_count = 0usize;

    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .context("failed to read request line from input stream")?;
        if bytes == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        processed_lines = processed_lines.saturating_add(1);
        state.transcript.append(trimmed);
        tracing::debug!(line = trimmed, "received request line");

        let request = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => value,
            Err(error) => {
                error_count = error_count.saturating_add(1);
                tracing::error!(%error, "malformed request line; ending session");
                state.transcript.append(&format!("parse error: {error}"));
                break;
            }
        };

        match dispatch_request(&request, state) {
            Ok(Some(response)) => {
                let encoded =
                    serde_json::to_string(&response).context("failed to encode response frame")?;
                writeln!(writer, "{encoded}").context("failed to write response line")?;
                writer.flush().context("failed to flush output stream")?;
                responses_written = responses_written.saturating_add(1);
            }
            Ok(None) => {}
            Err(error) => {
                error_count = error_count.saturating_add(1);
                tracing::error!(%error, "dispatch failed; ending session");
                state.transcript.append(&format!("dispatch error: {error}"));
                break;
            }
        }
    }

    Ok(ServeReport {
        processed_lines,
        responses_written,
        error_count,
    })
}

/// Routes one parsed request. `Ok(None)` is the first-class no-response
/// outcome: notifications (no `id`) and unrecognized methods are ignored
/// without emitting anything.
fn dispatch_request(request: &Value, state: &ServerState) -> Result<Option<Value>> {
    let Some(object) = request.as_object() else {
        bail!("request frame must be a JSON object");
    };
    let method = object
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(id) = object.get("id").cloned() else {
        tracing::debug!(method, "notification without id; ignoring");
        return Ok(None);
    };
    let params = match object.get("params") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let result = match method {
        "initialize" => initialize_result(),
        "tools/list" => tools_list_result(),
        "tools/call" => tools_call_result(&params, state),
        other => {
            tracing::debug!(method = other, "unsupported method; ignoring");
            return Ok(None);
        }
    };
    Ok(Some(jsonrpc_result_frame(id, result)))
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

fn tools_list_result() -> Value {
    json!({ "tools": tool_catalog::tool_descriptors() })
}

fn tools_call_result(params: &Map<String, Value>, state: &ServerState) -> Value {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let arguments = match params.get("arguments") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    let result = state.executor.invoke(name, &arguments);
    serde_json::to_value(&result).unwrap_or_else(|_| {
        json!({
            "content": [{"type": "text", "text": "failed to serialize tool result"}],
            "isError": true
        })
    })
}

fn jsonrpc_result_frame(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}
