//! Session directory reader and resolver.
//!
//! The gemini CLI owns session persistence. This module only reads the
//! listing printed by `gemini --list-sessions`, which looks like:
//!
//! ```text
//! Available sessions for this project (3):
//!   1. hello (2 hours ago) [0f6e1c52-...-01]
//!   2. code review (1 hour ago) [9a1b2c3d-...-02]
//! ```

use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::process::{GeminiCommand, ProcessRunner};

/// Flag that switches the CLI into listing mode.
pub const LIST_SESSIONS_FLAG: &str = "--list-sessions";

/// One entry of the session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// 1-based position in the listing; 1 is the oldest.
    pub index: u32,
    pub identifier: String,
}

fn listing_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\.\s+.*?\[([a-f0-9-]+)\]").expect("session listing pattern is valid")
    })
}

/// Parse listing text into records, in encounter order.
///
/// Lines that do not look like `<n>. <text> [<hex-id>]` are skipped. No
/// sorting or dedup happens here.
pub fn parse_session_listing(output: &str) -> Vec<SessionRecord> {
    output
        .lines()
        .filter_map(|line| {
            let caps = listing_line().captures(line)?;
            let index = caps[1].parse().ok()?;
            Some(SessionRecord {
                index,
                identifier: caps[2].to_string(),
            })
        })
        .collect()
}

/// Identifier of the record with the largest index.
pub fn latest_session(sessions: &[SessionRecord]) -> Option<&str> {
    sessions
        .iter()
        .max_by_key(|s| s.index)
        .map(|s| s.identifier.as_str())
}

/// Index of the first record whose identifier equals `hint` or starts with it.
///
/// Ambiguous prefixes resolve to the earliest record in listing order, so an
/// empty hint names the oldest session.
pub fn find_session_index(sessions: &[SessionRecord], hint: &str) -> Option<u32> {
    sessions
        .iter()
        .find(|s| s.identifier == hint || s.identifier.starts_with(hint))
        .map(|s| s.index)
}

/// Reads the external tool's session listing through a [`ProcessRunner`].
#[derive(Clone)]
pub struct SessionDirectory {
    runner: Arc<dyn ProcessRunner>,
    command: GeminiCommand,
}

impl SessionDirectory {
    pub fn new(runner: Arc<dyn ProcessRunner>, command: GeminiCommand) -> Self {
        Self { runner, command }
    }

    /// List sessions for the project rooted at `cwd` (or the server's own
    /// working directory).
    ///
    /// Any failure to run the listing yields an empty list: "no sessions"
    /// and "listing failed" look the same to callers.
    pub async fn list_sessions(&self, cwd: Option<&Path>) -> Vec<SessionRecord> {
        let invocation = self
            .command
            .invocation()
            .arg(LIST_SESSIONS_FLAG)
            .current_dir(cwd.map(Path::to_path_buf));

        match self.runner.run(&invocation).await {
            Ok(output) if output.success => {
                let sessions = parse_session_listing(&output.stdout);
                tracing::debug!(count = sessions.len(), "listed gemini sessions");
                sessions
            }
            Ok(output) => {
                tracing::debug!(code = ?output.code, stderr = %output.stderr.trim(), "session listing exited non-zero");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "session listing could not run");
                Vec::new()
            }
        }
    }

    /// Identifier of the most recent session, if any.
    pub async fn resolve_latest(&self, cwd: Option<&Path>) -> Option<String> {
        let sessions = self.list_sessions(cwd).await;
        latest_session(&sessions).map(str::to_string)
    }

    /// Listing index of the session named by a full or abbreviated identifier.
    pub async fn resolve_by_hint(&self, hint: &str, cwd: Option<&Path>) -> Option<u32> {
        let sessions = self.list_sessions(cwd).await;
        find_session_index(&sessions, hint)
    }
}
