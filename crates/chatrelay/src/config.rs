use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::llm::GeminiProvider;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderSettings,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let config: Self = serde_saphyr::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The whole-request bound must outlast the provider call, otherwise a
    /// slow provider surfaces as a request timeout instead of an upstream
    /// error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let request = self.server.request_timeout_seconds;
        let provider = self.provider.timeout_seconds;
        if request <= provider {
            return Err(ConfigError::Timeouts { request, provider });
        }
        Ok(())
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_request_timeout() -> u64 {
    60
}

// ============================================================================
// ProviderSettings
// ============================================================================

/// Which backend answers chat requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Gemini,
    Echo,
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub mode: ProviderMode,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            mode: ProviderMode::default(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

fn default_model() -> String {
    GeminiProvider::DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    GeminiProvider::DEFAULT_BASE_URL.to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

// ============================================================================
// ProviderConfig
// ============================================================================

/// Provider credentials, read once at startup and never mutated.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
}

impl ProviderConfig {
    /// Read the API key from [`API_KEY_ENV`].
    pub fn from_env() -> Option<Self> {
        Self::from_value(std::env::var(API_KEY_ENV).ok())
    }

    /// A blank key counts as no key.
    pub fn from_value(value: Option<String>) -> Option<Self> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|api_key| Self { api_key })
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error(
        "server.request_timeout_seconds ({request}) must be greater than \
        provider.timeout_seconds ({provider})"
    )]
    Timeouts { request: u64, provider: u64 },
}

// ============================================================================
// Tests
// ============================================================================
