//! Diagnostic logging and the raw protocol traffic log.
//!
//! Stdout carries the JSON-RPC stream, so all diagnostics go to stderr.

use chrono::Utc;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "gemini_mcp=info";

/// Install the stderr tracing subscriber. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "gemini_mcp=debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Set up the log directory and return a fresh timestamped log file path.
pub fn setup_log_file() -> Result<PathBuf> {
    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    Ok(log_dir.join(format!("{}.log", timestamp)))
}

/// Get the log directory path.
pub fn log_directory() -> PathBuf {
    let base_dir = env::var("TMPDIR")
        .or_else(|_| env::var("XDG_RUNTIME_DIR"))
        .unwrap_or_else(|_| "/tmp".to_string());

    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    PathBuf::from(base_dir)
        .join("gemini-mcp")
        .join("logs")
        .join(project_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn marker(self) -> &'static str {
        match self {
            Direction::Inbound => "<<",
            Direction::Outbound => ">>",
        }
    }
}

/// Append-only copy of every protocol line, for debugging client sessions.
#[derive(Debug)]
pub struct TrafficLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl TrafficLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open traffic log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Open a new log under [`log_directory`].
    pub fn create_default() -> Result<Self> {
        Self::open(&setup_log_file()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line. Failures are logged and otherwise ignored.
    pub fn record(&self, direction: Direction, line: &str) {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(e) = writeln!(file, "{} {} {}", timestamp, direction.marker(), line) {
            tracing::debug!(error = %e, path = %self.path.display(), "traffic log write failed");
        }
    }
}
