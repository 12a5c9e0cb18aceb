//! Resolved runtime configuration and validation.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::gemini::{Executor, ExecutorSettings, GeminiCommand, LaunchMode, TokioProcessRunner};
use crate::project::ProjectConfig;

/// Overrides taken from the command line or environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub command: Option<String>,
    pub model: Option<String>,
    pub launch: Option<String>,
    pub raw_log: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub command: GeminiCommand,
    pub launch: LaunchMode,
    /// Model used when a request does not name one.
    pub default_model: Option<String>,
    pub system_prompt_env: String,
    pub latest_token: String,
    pub server_name: String,
    pub raw_log: bool,
    /// Config file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl Config {
    /// Merge the config file with overrides. Overrides win.
    pub fn from_args(project: ProjectConfig, overrides: Overrides) -> Result<Self> {
        let file = project.config;

        let command_line = overrides.command.unwrap_or(file.gemini.command);
        let command = GeminiCommand::parse(&command_line)?;

        let launch = match overrides.launch {
            Some(launch) => LaunchMode::from_str(&launch)?,
            None => file.gemini.launch,
        };

        let default_model = overrides
            .model
            .or(file.gemini.model)
            .filter(|m| !m.trim().is_empty());

        if file.gemini.system_prompt_env.trim().is_empty() {
            bail!("system_prompt_env must not be empty");
        }
        if file.gemini.latest_token.trim().is_empty() {
            bail!("latest_token must not be empty");
        }

        Ok(Config {
            command,
            launch,
            default_model,
            system_prompt_env: file.gemini.system_prompt_env,
            latest_token: file.gemini.latest_token,
            server_name: file.server.name,
            raw_log: overrides.raw_log || file.server.raw_log,
            source: project.source,
        })
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            command: self.command.clone(),
            default_model: self.default_model.clone(),
            system_prompt_env: self.system_prompt_env.clone(),
            latest_token: self.latest_token.clone(),
        }
    }

    /// Executor backed by real gemini processes.
    pub fn executor(&self) -> Executor {
        Executor::new(
            Arc::new(TokioProcessRunner::new(self.launch)),
            self.executor_settings(),
        )
    }
}
