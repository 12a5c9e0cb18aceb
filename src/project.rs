//! Bridge configuration discovery and loading.
//!
//! Settings live in an optional `.gemini-mcp.toml`. Discovery walks up the
//! directory tree from the working directory; when nothing is found the
//! built-in defaults apply.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::gemini::executor::{DEFAULT_LATEST_TOKEN, DEFAULT_SYSTEM_PROMPT_ENV};
use crate::gemini::LaunchMode;

pub const CONFIG_FILE_NAME: &str = ".gemini-mcp.toml";

/// Configuration plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    /// The file the configuration was read from, if any.
    pub source: Option<PathBuf>,
    pub config: BridgeConfig,
}

/// Contents of `.gemini-mcp.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeminiSection {
    /// Shell-style command line used to launch gemini.
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_system_prompt_env")]
    pub system_prompt_env: String,
    #[serde(default = "default_latest_token")]
    pub latest_token: String,
    #[serde(default)]
    pub launch: LaunchMode,
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            model: None,
            system_prompt_env: default_system_prompt_env(),
            latest_token: default_latest_token(),
            launch: LaunchMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Name reported in `serverInfo`.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Mirror all protocol traffic to a log file under the temp directory.
    #[serde(default)]
    pub raw_log: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            raw_log: false,
        }
    }
}

fn default_command() -> String {
    "gemini".to_string()
}

fn default_system_prompt_env() -> String {
    DEFAULT_SYSTEM_PROMPT_ENV.to_string()
}

fn default_latest_token() -> String {
    DEFAULT_LATEST_TOKEN.to_string()
}

fn default_server_name() -> String {
    "gemini-mcp-server".to_string()
}

/// Discover the configuration by walking up from CWD.
pub fn discover() -> Result<ProjectConfig> {
    let cwd = env::current_dir()?;
    discover_from(&cwd)
}

/// Discover the configuration starting from a specific directory.
///
/// Returns defaults when no config file exists anywhere up the tree.
pub fn discover_from(start: &Path) -> Result<ProjectConfig> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return load(&config_path);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(ProjectConfig::default()),
        }
    }
}

/// Load an explicit config file. A missing file is an error here.
pub fn load(path: &Path) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: BridgeConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(ProjectConfig {
        source: Some(path.to_path_buf()),
        config,
    })
}

/// Write a commented default config into the current directory.
pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    init_in_dir(&cwd)
}

/// Idempotent: an existing config file is left untouched.
pub fn init_in_dir(dir: &Path) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        println!("{} already exists, skipping.", CONFIG_FILE_NAME);
        return Ok(());
    }

    let default_config = r#"[gemini]
# command = "gemini"
# model = "gemini-2.5-pro"
# system_prompt_env = "GEMINI_SYSTEM_MD"
# latest_token = "latest"
# launch = "direct"

[server]
# name = "gemini-mcp-server"
# raw_log = false
"#;
    fs::write(&config_path, default_config)
        .with_context(|| format!("Failed to create {}", CONFIG_FILE_NAME))?;
    println!("Created {}", CONFIG_FILE_NAME);

    Ok(())
}
