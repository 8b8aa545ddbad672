//! Model backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Default base URL of the local inference server.
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";

/// Default base URL of the hosted API.
pub const DEFAULT_HOSTED_BASE_URL: &str = "https://api.openai.com/v1";

/// Default local inference model.
pub const DEFAULT_LOCAL_MODEL: &str = "llama3";

/// Default hosted model.
pub const DEFAULT_HOSTED_MODEL: &str = "gpt-4o-mini";

/// Model backend configuration
///
/// Only values live here. Which backend is used is decided by the selection
/// policy in `adapters::backends`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Explicit provider selector
    pub provider: Option<BackendProvider>,

    /// Base URL override for the selected network backend
    pub base_url: Option<String>,

    /// Model identifier override
    pub model: Option<String>,

    /// Hosted API credential
    pub api_key: Option<String>,

    /// Always use the simulated backend
    #[serde(default)]
    pub force_mock: bool,

    /// Simulated backend delay before the first fragment, in milliseconds
    #[serde(default = "default_think_delay")]
    pub think_delay_ms: u64,

    /// Simulated backend delay between fragments, in milliseconds
    #[serde(default = "default_fragment_delay")]
    pub fragment_delay_ms: u64,
}

/// Provider selector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    #[serde(alias = "mock")]
    Simulated,
    #[serde(alias = "ollama")]
    Local,
    #[serde(alias = "openai")]
    Hosted,
}

impl BackendConfig {
    /// Check if a non-empty hosted credential is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Base URL for the local inference backend
    pub fn local_base_url(&self) -> String {
        self.base_url_or(DEFAULT_LOCAL_BASE_URL)
    }

    /// Base URL for the hosted backend
    pub fn hosted_base_url(&self) -> String {
        self.base_url_or(DEFAULT_HOSTED_BASE_URL)
    }

    /// Model for the local inference backend
    pub fn local_model(&self) -> String {
        self.model_or(DEFAULT_LOCAL_MODEL)
    }

    /// Model for the hosted backend
    pub fn hosted_model(&self) -> String {
        self.model_or(DEFAULT_HOSTED_MODEL)
    }

    /// Simulated think delay as Duration
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    /// Simulated per-fragment delay as Duration
    pub fn fragment_delay(&self) -> Duration {
        Duration::from_millis(self.fragment_delay_ms)
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ValidationError::InvalidBaseUrl(url.clone()));
            }
        }
        if self.model.as_ref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ValidationError::EmptyModel);
        }
        Ok(())
    }

    fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    fn model_or(&self, default: &str) -> String {
        self.model.clone().unwrap_or_else(|| default.to_string())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: None,
            base_url: None,
            model: None,
            api_key: None,
            force_mock: false,
            think_delay_ms: default_think_delay(),
            fragment_delay_ms: default_fragment_delay(),
        }
    }
}

fn default_think_delay() -> u64 {
    800
}

fn default_fragment_delay() -> u64 {
    40
}
