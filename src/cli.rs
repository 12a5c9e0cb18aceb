//! CLI argument parsing using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// MCP server exposing the gemini CLI as conversational tools.
///
/// With no subcommand, serves the Model Context Protocol over stdio.
#[derive(Parser, Debug)]
#[command(name = "gemini-mcp", version, about, long_about = None)]
pub struct Args {
    /// Config file (default: nearest .gemini-mcp.toml)
    #[arg(long, global = true, value_name = "PATH", env = "GEMINI_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Command used to launch gemini, split with shell rules
    #[arg(long, global = true, value_name = "CMD", env = "GEMINI_MCP_COMMAND")]
    pub command: Option<String>,

    /// Default model when a request does not name one
    #[arg(long, global = true, value_name = "MODEL", env = "GEMINI_MCP_MODEL")]
    pub model: Option<String>,

    /// How to launch gemini: direct or shell
    #[arg(long, global = true, value_name = "MODE", env = "GEMINI_MCP_LAUNCH")]
    pub launch: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command_kind: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve MCP over stdio (default)
    Serve {
        /// Mirror protocol traffic to a log file in the temp directory
        #[arg(long)]
        raw_log: bool,
    },
    /// List gemini sessions for a directory
    Sessions {
        /// Directory whose sessions to list
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,

        /// Report which session index an identifier or prefix matches
        #[arg(long, value_name = "HINT")]
        find: Option<String>,
    },
    /// Send one prompt and print the answer
    Ask {
        /// Prompt text
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Continue a session; without a value, the latest one
        #[arg(long, value_name = "ID", num_args = 0..=1, default_missing_value = "")]
        resume: Option<String>,

        /// File whose contents become the system prompt
        #[arg(long, value_name = "PATH")]
        system_prompt_file: Option<PathBuf>,

        /// Working directory for gemini
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },
    /// Write a commented .gemini-mcp.toml in the current directory
    Init,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Overrides for [`crate::config::Config::from_args`].
    pub fn overrides(&self) -> Overrides {
        let raw_log = matches!(self.command_kind, Some(Command::Serve { raw_log: true }));
        Overrides {
            command: self.command.clone(),
            model: self.model.clone(),
            launch: self.launch.clone(),
            raw_log,
        }
    }
}

/// `--resume` with no value or a blank value means the latest session.
pub fn resume_hint(resume: &str) -> Option<String> {
    let trimmed = resume.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
