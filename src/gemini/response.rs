//! Decoding of `gemini --output-format json` output.

use serde_json::Value;

/// Normalized view of one gemini run's stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Text to hand back to the caller.
    pub response: String,
    /// Session id the tool reported about itself, if any.
    pub session_id: Option<String>,
    /// `error.message` from a structured error payload.
    pub error: Option<String>,
    /// True when `response` came from a `response` field rather than a dump
    /// of the object or the raw text.
    pub has_response_field: bool,
}

/// Parse stdout into a [`ParsedOutput`].
///
/// Decoding never fails: a JSON value without a usable `response` string is
/// dumped back to compact JSON, and text that is not JSON at all is returned
/// verbatim.
pub fn parse_output(stdout: &str) -> ParsedOutput {
    match decode(stdout) {
        Some(json) => from_json(json),
        None => ParsedOutput {
            response: stdout.to_string(),
            session_id: None,
            error: None,
            has_response_field: false,
        },
    }
}

/// Output that is not a single JSON document is not decoded at all.
fn decode(stdout: &str) -> Option<Value> {
    serde_json::from_str(stdout).ok()
}

fn from_json(json: Value) -> ParsedOutput {
    let response = non_empty_str(json.get("response"));
    let session_id = non_empty_str(json.get("session_id"));
    let error = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match response {
        Some(response) => ParsedOutput {
            response,
            session_id,
            error,
            has_response_field: true,
        },
        None => ParsedOutput {
            response: json.to_string(),
            session_id,
            error,
            has_response_field: false,
        },
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
