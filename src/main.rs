//! gemini-mcp - MCP server bridging to the gemini CLI

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use gemini_mcp::cli::{self, Args, Command};
use gemini_mcp::config::{Config, Overrides};
use gemini_mcp::gemini::sessions::{find_session_index, latest_session};
use gemini_mcp::gemini::{InvocationRequest, SessionTarget};
use gemini_mcp::mcp::server::{self, McpServer};
use gemini_mcp::output::{formatter, logger};
use gemini_mcp::project;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse_args();
    logger::init_tracing(args.verbose);

    let overrides = args.overrides();
    let config_path = args.config.as_deref();

    match args.command_kind {
        Some(Command::Init) => {
            project::init()?;
            Ok(ExitCode::SUCCESS)
        }
        None | Some(Command::Serve { .. }) => {
            let config = load_config(config_path, overrides)?;
            let traffic = if config.raw_log {
                let log = logger::TrafficLog::create_default()?;
                tracing::info!(path = %log.path().display(), "raw traffic log enabled");
                Some(Arc::new(log))
            } else {
                None
            };
            let server = McpServer::new(config.executor(), config.server_name.clone());
            server::run_stdio(Arc::new(server), traffic).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Sessions { cwd, find }) => {
            let executor = load_config(config_path, overrides)?.executor();
            let sessions = executor.directory().list_sessions(cwd.as_deref()).await;
            formatter::print_sessions(&sessions, latest_session(&sessions));
            if let Some(hint) = find {
                formatter::print_match(&hint, find_session_index(&sessions, &hint));
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Ask {
            prompt,
            resume,
            system_prompt_file,
            cwd,
        }) => {
            if prompt.is_empty() {
                bail!("prompt must not be empty");
            }

            let system_prompt = match system_prompt_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let target = match resume {
                Some(resume) => SessionTarget::Resume(cli::resume_hint(&resume)),
                None => SessionTarget::New,
            };
            let request = InvocationRequest::new(prompt, target)
                .with_system_prompt(system_prompt)
                .with_cwd(cwd);

            match load_config(config_path, overrides)?.executor().execute(&request).await {
                Ok(result) => {
                    formatter::print_answer(&result);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    formatter::print_error(&e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Resolve the runtime config from an explicit path or by discovery.
fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let project = match path {
        Some(path) => project::load(path)?,
        None => project::discover()?,
    };
    let config = Config::from_args(project, overrides)?;
    if let Some(source) = &config.source {
        tracing::debug!(path = %source.display(), "loaded config");
    }
    Ok(config)
}
