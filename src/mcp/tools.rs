//! Tool catalogue and `tools/call` dispatch.
//!
//! - `gemini`: start a new conversation
//! - `gemini-reply`: continue a conversation (latest when no `sessionId`)
//! - `gemini-sessions`: show the session listing, optionally matching a hint

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::gemini::sessions::{find_session_index, latest_session};
use crate::gemini::{ExecutionError, Executor, InvocationRequest, SessionTarget};

use super::types::{ToolDefinition, ToolResult};

pub const START_TOOL: &str = "gemini";
pub const REPLY_TOOL: &str = "gemini-reply";
pub const SESSIONS_TOOL: &str = "gemini-sessions";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Definitions returned by `tools/list`.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: START_TOOL,
            description: "Start a new Gemini session with a prompt. Returns the response and the new Session ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt to start the session with."
                    },
                    "model": {
                        "type": "string",
                        "description": "Optional: The model to use (e.g., 'gemini-2.5-pro', 'gemini-2.5-flash')."
                    },
                    "systemPrompt": {
                        "type": "string",
                        "description": "Optional: System instructions for this session."
                    },
                    "cwd": {
                        "type": "string",
                        "description": "Optional: Working directory to run Gemini in. Sessions are scoped per directory."
                    }
                },
                "required": ["prompt"]
            }),
        },
        ToolDefinition {
            name: REPLY_TOOL,
            description: "Continue an existing Gemini session.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt to continue the conversation."
                    },
                    "sessionId": {
                        "type": "string",
                        "description": "The session ID (or a prefix of it) to continue. If not provided, the latest session is used."
                    },
                    "model": {
                        "type": "string",
                        "description": "Optional: The model to use for this turn."
                    },
                    "systemPrompt": {
                        "type": "string",
                        "description": "Optional: System instructions for this turn."
                    },
                    "cwd": {
                        "type": "string",
                        "description": "Optional: Working directory the session was started in."
                    }
                },
                "required": ["prompt"]
            }),
        },
        ToolDefinition {
            name: SESSIONS_TOOL,
            description: "List Gemini sessions for a directory, oldest first.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "hint": {
                        "type": "string",
                        "description": "Optional: A session ID or prefix to look up."
                    },
                    "cwd": {
                        "type": "string",
                        "description": "Optional: Directory whose sessions to list."
                    }
                }
            }),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartArgs {
    prompt: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    cwd: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyArgs {
    prompt: Option<String>,
    session_id: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    cwd: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionsArgs {
    hint: Option<String>,
    cwd: Option<PathBuf>,
}

/// Run the named tool.
///
/// Only an unknown tool name is an error; everything that goes wrong while
/// running a known tool comes back as an error-flagged [`ToolResult`].
pub async fn call_tool(
    executor: &Executor,
    name: &str,
    arguments: Value,
) -> Result<ToolResult, ToolError> {
    let result = match name {
        START_TOOL => match parse_args::<StartArgs>(name, arguments) {
            Ok(args) => match require_prompt(args.prompt) {
                Ok(prompt) => {
                    let request = InvocationRequest::new(prompt, SessionTarget::New)
                        .with_model(args.model)
                        .with_system_prompt(args.system_prompt)
                        .with_cwd(args.cwd);
                    execute(executor, request).await
                }
                Err(result) => result,
            },
            Err(result) => result,
        },
        REPLY_TOOL => match parse_args::<ReplyArgs>(name, arguments) {
            Ok(args) => match require_prompt(args.prompt) {
                Ok(prompt) => {
                    let request = InvocationRequest::new(prompt, SessionTarget::Resume(args.session_id))
                        .with_model(args.model)
                        .with_system_prompt(args.system_prompt)
                        .with_cwd(args.cwd);
                    execute(executor, request).await
                }
                Err(result) => result,
            },
            Err(result) => result,
        },
        SESSIONS_TOOL => match parse_args::<SessionsArgs>(name, arguments) {
            Ok(args) => list_sessions(executor, args).await,
            Err(result) => result,
        },
        _ => return Err(ToolError::UnknownTool(name.to_string())),
    };
    Ok(result)
}

/// Null or missing arguments mean "no arguments".
fn parse_args<T: DeserializeOwned + Default>(tool: &str, arguments: Value) -> Result<T, ToolResult> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(arguments)
        .map_err(|e| ToolResult::error(format!("Invalid arguments for {tool}: {e}")))
}

fn require_prompt(prompt: Option<String>) -> Result<String, ToolResult> {
    match prompt {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(ToolResult::error("Missing required argument: prompt")),
    }
}

async fn execute(executor: &Executor, request: InvocationRequest) -> ToolResult {
    match executor.execute(&request).await {
        Ok(result) => {
            let structured = json!({
                "response": result.response_text,
                "sessionId": result.session_id,
            });
            ToolResult::text(result.response_text)
                .with_session_id(result.session_id)
                .with_structured(structured)
        }
        Err(e) => {
            tracing::warn!(error = %e, "gemini invocation failed");
            ToolResult::error(failure_text(&e))
        }
    }
}

/// Caller-facing text for a failed invocation: the error plus any stderr.
pub fn failure_text(error: &ExecutionError) -> String {
    let mut text = format!("Error executing gemini: {error}");
    if let Some(stderr) = error.diagnostics() {
        text.push_str("\n\nstderr:\n");
        text.push_str(stderr);
    }
    text
}

async fn list_sessions(executor: &Executor, args: SessionsArgs) -> ToolResult {
    let sessions = executor.directory().list_sessions(args.cwd.as_deref()).await;
    let latest = latest_session(&sessions).map(str::to_string);
    let matched = args
        .hint
        .as_deref()
        .and_then(|hint| find_session_index(&sessions, hint));

    let mut text = if sessions.is_empty() {
        "No sessions found.".to_string()
    } else {
        sessions
            .iter()
            .map(|s| format!("{}. {}", s.index, s.identifier))
            .collect::<Vec<_>>()
            .join("\n")
    };
    if let Some(latest) = &latest {
        text.push_str(&format!("\n\nLatest: {latest}"));
    }
    if let Some(hint) = &args.hint {
        match matched {
            Some(index) => text.push_str(&format!("\n\"{hint}\" matches session {index}")),
            None => text.push_str(&format!("\nNo session matches \"{hint}\"")),
        }
    }

    let structured = json!({
        "sessions": sessions
            .iter()
            .map(|s| json!({"index": s.index, "identifier": s.identifier}))
            .collect::<Vec<_>>(),
        "latest": latest,
        "match": matched,
    });
    ToolResult::text(text).with_structured(structured)
}
