//! Layered configuration for the proposal generator.
//!
//! Settings are read from an optional `proposer.toml`, then overridden by
//! environment variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! model = "gpt-4o-mini"
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! connect_timeout_secs = 30
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//!
//! [pipeline]
//! stagger_ms = 200
//! channel_capacity = 64
//!
//! [logging]
//! json = false
//! log_dir = "logs"
//! ```
//!
//! # Environment
//!
//! | Variable            | Overrides            |
//! |---------------------|----------------------|
//! | `OPENAI_API_KEY`    | API key (name set by `api_key_env`) |
//! | `OPENAI_BASE_URL`   | `llm.base_url`       |
//! | `PROPOSER_MODEL`    | `llm.model`          |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::OpenAiConfig;
use crate::llm::openai::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::pipeline::PipelineConfig;
use crate::web::ServerConfig;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "proposer.toml";

pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "PROPOSER_MODEL";

/// LLM connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable the API key is read from
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Generation run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Pause between the initial agent `started` events, in milliseconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_stagger_ms() -> u64 {
    200
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// The complete proposer.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposerToml {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ProposerToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse proposer.toml")
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.llm.model.trim().is_empty() {
            warnings.push("llm.model is empty".to_string());
        }
        if let Some(ref url) = self.llm.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            warnings.push(format!(
                "Invalid llm.base_url '{}': should start with http:// or https://",
                url
            ));
        }
        if self.llm.api_key_env.trim().is_empty() {
            warnings.push("llm.api_key_env is empty".to_string());
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0: an ephemeral port will be chosen".to_string());
        }
        if self.pipeline.channel_capacity == 0 {
            warnings.push("pipeline.channel_capacity is 0: using 1".to_string());
        }
        if self.pipeline.stagger_ms > 5_000 {
            warnings.push(format!(
                "pipeline.stagger_ms is {}: runs will wait {}s before dispatching",
                self.pipeline.stagger_ms,
                self.pipeline.stagger_ms.saturating_mul(4) / 1000
            ));
        }

        warnings
    }
}

/// Find the config file: an explicit path, else `./proposer.toml`, else
/// `<config dir>/proposer/config.toml`.
pub fn discover_config_path(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("proposer").join("config.toml"))
        .filter(|path| path.exists())
}

/// Unified configuration: the parsed file plus environment overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where the file layer came from, if any
    pub source: Option<PathBuf>,
    pub toml: ProposerToml,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Settings {
    /// Load the file layer (if any) and apply the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let working_dir = std::env::current_dir().context("Failed to read working directory")?;
        let source = discover_config_path(explicit, &working_dir);
        let toml = match &source {
            Some(path) => ProposerToml::load(path)?,
            None => ProposerToml::default(),
        };
        Ok(Self::resolve(source, toml, |name| std::env::var(name).ok()))
    }

    /// Apply environment overrides to a parsed file, reading variables
    /// through `env`.
    pub fn resolve(
        source: Option<PathBuf>,
        toml: ProposerToml,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let model = env(ENV_MODEL).unwrap_or_else(|| toml.llm.model.clone());
        let base_url = env(ENV_BASE_URL)
            .or_else(|| toml.llm.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = env(&toml.llm.api_key_env);

        Self {
            source,
            toml,
            model,
            base_url,
            api_key,
        }
    }

    pub fn llm_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            api_key_env: self.toml.llm.api_key_env.clone(),
            connect_timeout: Duration::from_secs(self.toml.llm.connect_timeout_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            stagger: Duration::from_millis(self.toml.pipeline.stagger_ms),
            channel_capacity: self.toml.pipeline.channel_capacity.max(1),
        }
    }

    /// Server settings from the file layer; CLI flags are applied by the caller.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.toml.server.host.clone(),
            port: self.toml.server.port,
            ..ServerConfig::default()
        }
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.api_key.is_none() {
            warnings.push(format!(
                "{} is not set: generation requests will fail",
                self.toml.llm.api_key_env
            ));
        }
        warnings
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string());
        let api_key = if self.api_key.is_some() { "set" } else { "missing" };

        writeln!(f, "config file:      {}", source)?;
        writeln!(f, "model:            {}", self.model)?;
        writeln!(f, "base url:         {}", self.base_url)?;
        writeln!(f, "api key:          {} ({})", api_key, self.toml.llm.api_key_env)?;
        writeln!(
            f,
            "listen:           {}:{}",
            self.toml.server.host, self.toml.server.port
        )?;
        writeln!(f, "stagger:          {}ms", self.toml.pipeline.stagger_ms)?;
        write!(
            f,
            "log format:       {}",
            if self.toml.logging.json { "json" } else { "text" }
        )
    }
}
