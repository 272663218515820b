//! Host application configuration, loaded from TOML.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [llm]
//! base_url = "https://api.openai.com"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [agent]
//! endpoint = "http://127.0.0.1:8100"
//! token_env = "SHOPSIFT_AGENT_TOKEN"
//!
//! [search]
//! source_timeout_seconds = 180
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shopsift_search::SearchConfig;

use crate::error::{AppError, Result};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SHOPSIFT_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// OpenAI-compatible model used for safety checks and structuring.
    pub llm: LlmConfig,
    /// Browser-agent extraction service used to search platforms.
    pub agent: AgentConfig,
    /// Query pipeline settings.
    pub search: SearchConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. `0` binds an ephemeral port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// OpenAI-compatible chat completions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider base URL, without the `/v1/...` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key_env: "OPENAI_API_KEY".to_owned(),
        }
    }
}

impl LlmConfig {
    /// API key read from [`api_key_env`](Self::api_key_env), if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.api_key_env)
    }
}

/// Browser-agent extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the service.
    pub endpoint: String,
    /// Name of the environment variable holding its bearer token, if any.
    pub token_env: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8100".to_owned(),
            token_env: None,
        }
    }
}

impl AgentConfig {
    /// Bearer token read from [`token_env`](Self::token_env), if configured.
    pub fn token(&self) -> Option<String> {
        self.token_env.as_deref().and_then(read_env)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found; using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from the path given by [`config_path`](Self::config_path).
    ///
    /// # Errors
    ///
    /// Same as [`load_or_default`](Self::load_or_default).
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path())
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The config file location: `$SHOPSIFT_CONFIG` if set, otherwise
    /// [`default_config_path`](Self::default_config_path).
    pub fn config_path() -> PathBuf {
        resolve_config_path(std::env::var_os(CONFIG_PATH_ENV))
    }

    /// Returns the default config file path: `~/.config/shopsift/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("shopsift").join("config.toml")
        } else if let Some(config) = dirs::config_dir() {
            config.join("shopsift").join("config.toml")
        } else {
            PathBuf::from("/tmp/shopsift-config/config.toml")
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for an empty host or model, an invalid
    /// LLM base URL or agent endpoint, and any [`SearchConfig`] error.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host must not be empty".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("llm.model must not be empty".into()));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(AppError::Config("llm.api_key_env must not be empty".into()));
        }
        check_http_url("llm.base_url", &self.llm.base_url)?;
        check_http_url("agent.endpoint", &self.agent.endpoint)?;
        self.search
            .validate()
            .map_err(|e| AppError::Config(format!("search: {e}")))?;
        Ok(())
    }
}

fn resolve_config_path(override_path: Option<OsString>) -> PathBuf {
    match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => AppConfig::default_config_path(),
    }
}

fn check_http_url(field: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AppError::Config(format!("{field} is not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Config(format!("{field} must use http or https")));
    }
    Ok(())
}
