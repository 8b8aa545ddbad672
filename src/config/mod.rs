//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PROMPT_REFINERY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use prompt_refinery::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod backend;
mod error;
mod server;

pub use backend::{
    BackendConfig, BackendProvider, DEFAULT_HOSTED_BASE_URL, DEFAULT_HOSTED_MODEL,
    DEFAULT_LOCAL_BASE_URL, DEFAULT_LOCAL_MODEL,
};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// configuration backed by the simulated model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Model backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PROMPT_REFINERY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PROMPT_REFINERY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PROMPT_REFINERY__BACKEND__PROVIDER=local` -> `backend.provider = local`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROMPT_REFINERY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.backend.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PROMPT_REFINERY__SERVER__PORT",
        "PROMPT_REFINERY__SERVER__ENVIRONMENT",
        "PROMPT_REFINERY__BACKEND__PROVIDER",
        "PROMPT_REFINERY__BACKEND__MODEL",
        "PROMPT_REFINERY__BACKEND__FORCE_MOCK",
        "PROMPT_REFINERY__BACKEND__BASE_URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.backend.provider.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROMPT_REFINERY__SERVER__PORT", "9090");
        env::set_var("PROMPT_REFINERY__BACKEND__PROVIDER", "local");
        env::set_var("PROMPT_REFINERY__BACKEND__MODEL", "mistral");
        env::set_var("PROMPT_REFINERY__BACKEND__FORCE_MOCK", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.backend.provider, Some(BackendProvider::Local));
        assert_eq!(config.backend.local_model(), "mistral");
        assert!(config.backend.force_mock);
    }

    #[test]
    fn test_production_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROMPT_REFINERY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_validate_rejects_bad_backend_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROMPT_REFINERY__BACKEND__BASE_URL", "ftp://example.com");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl(_))
        ));
    }
}
