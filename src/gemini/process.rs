//! Process invocation capability for the gemini CLI.
//!
//! Everything that talks to the external binary goes through the
//! [`ProcessRunner`] trait so the session directory and the executor can be
//! driven by a scripted runner in tests. [`TokioProcessRunner`] is the real
//! implementation.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// How the external binary is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Spawn the program with an argv vector, no shell involved.
    #[default]
    Direct,
    /// Render the invocation into one command line and run it with `sh -c`.
    Shell,
}

impl LaunchMode {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(LaunchMode::Direct),
            "shell" => Ok(LaunchMode::Shell),
            _ => Err(anyhow!("invalid launch mode '{}' (expected direct or shell)", s)),
        }
    }
}

/// The configured gemini command: program plus any fixed leading arguments.
///
/// Built from a shell-style string such as `gemini` or
/// `npx -y @google/gemini-cli`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiCommand {
    pub program: String,
    pub base_args: Vec<String>,
}

impl GeminiCommand {
    /// Split a command string with POSIX shell rules.
    pub fn parse(command: &str) -> Result<Self> {
        let parts = shlex::split(command)
            .ok_or_else(|| anyhow!("invalid gemini command: failed to parse \"{}\"", command))?;
        let mut iter = parts.into_iter();
        let program = iter
            .next()
            .ok_or_else(|| anyhow!("gemini command is empty"))?;
        Ok(Self {
            program,
            base_args: iter.collect(),
        })
    }

    /// Start an invocation with the base arguments already in place.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            program: self.program.clone(),
            args: self.base_args.clone(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }
}

/// A fully composed process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment for this call only.
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Render program and arguments as a single `sh` command line.
    ///
    /// Arguments made only of shell-inert characters are emitted bare;
    /// everything else goes through [`quote_double`].
    pub fn to_shell_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| shell_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_word(word: &str) -> String {
    let inert = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+%".contains(c));
    if inert {
        word.to_string()
    } else {
        quote_double(word)
    }
}

/// Wrap `text` in double quotes so a POSIX shell reads it back unchanged.
///
/// Inside double quotes only `\`, `"`, `$` and backtick are special, so those
/// four get a backslash. Newlines and single quotes are literal.
pub fn quote_double(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Capability to run one external process to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Runs invocations with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner {
    pub mode: LaunchMode,
}

impl TokioProcessRunner {
    pub fn new(mode: LaunchMode) -> Self {
        Self { mode }
    }

    fn command(&self, invocation: &Invocation) -> tokio::process::Command {
        let mut cmd = match self.mode {
            LaunchMode::Direct => {
                let mut cmd = tokio::process::Command::new(&invocation.program);
                cmd.args(&invocation.args);
                cmd
            }
            LaunchMode::Shell => {
                let mut cmd = tokio::process::Command::new("sh");
                cmd.arg("-c").arg(invocation.to_shell_line());
                cmd
            }
        };
        cmd.envs(&invocation.env);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        tracing::debug!(
            program = %invocation.program,
            args = ?invocation.args,
            mode = ?self.mode,
            "spawning process"
        );
        let output = self.command(invocation).output().await?;
        Ok(ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
