//! Client configuration: backend URL and form defaults.
//!
//! Sources, highest precedence first: the `--api-url` flag, the
//! `DHARMA_QA_API_URL` environment variable, the TOML config file, and the
//! built-in default.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::normalize_top_k;
use crate::types::DEFAULT_TOP_K;

/// Environment variable selecting the backend base URL.
pub const API_URL_ENV: &str = "DHARMA_QA_API_URL";

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Errors from loading or validating the client config.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(dharma::config::read),
        help("Ensure the config file is readable, or remove it to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(dharma::config::parse),
        help("Check the TOML syntax. Recognized keys: api_url, default_top_k.")
    )]
    Parse { path: String, message: String },

    #[error("invalid backend URL: \"{url}\"")]
    #[diagnostic(
        code(dharma::config::invalid_url),
        help("The backend URL must start with http:// or https://, e.g. http://localhost:8000")
    )]
    InvalidUrl { url: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the question-answering backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Initial value of the result-count field.
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_top_k: default_top_k(),
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.default_top_k = normalize_top_k(i64::from(config.default_top_k));
        Ok(config)
    }

    /// Apply an environment-variable value. Empty values count as unset.
    pub fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    /// Apply [`API_URL_ENV`] from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_override(std::env::var(API_URL_ENV).ok());
    }

    /// Apply an explicit command-line URL.
    pub fn apply_cli_override(&mut self, api_url: Option<&str>) {
        if let Some(url) = api_url {
            self.api_url = url.trim().to_string();
        }
    }

    /// Check the URL scheme and strip any trailing slash.
    pub fn validate(mut self) -> ConfigResult<Self> {
        let url = self.api_url.trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                url: self.api_url.clone(),
            });
        }
        self.api_url = url.to_string();
        Ok(self)
    }

    /// Full resolution: file, then environment, then CLI flag, then validation.
    pub fn resolve(path: &Path, cli_api_url: Option<&str>) -> ConfigResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env();
        config.apply_cli_override(cli_api_url);
        config.validate()
    }
}
