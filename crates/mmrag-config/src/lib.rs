//! # mmrag-config
//!
//! Layered configuration loading for mmrag using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MMRAG_*` prefix, `__` as separator)
//! 2. Project-level `.mmrag/config.toml`
//! 3. User-level `~/.config/mmrag/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `MMRAG_API__BASE_URL` -> `api.base_url`,
//! `MMRAG_IDENTITY__TENANT_ID` -> `identity.tenant_id`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use mmrag_config::MmragConfig;
//!
//! let config = MmragConfig::load_with_dotenv().expect("config");
//! config.validate().expect("identity settings are required");
//! println!("querying {}", config.api.query_url());
//! ```

mod api;
mod error;
mod identity;
mod ui;

pub use api::ApiConfig;
pub use error::ConfigError;
pub use identity::IdentityConfig;
pub use ui::UiConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MmragConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl MmragConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`load_with_dotenv`](Self::load_with_dotenv)
    /// if you need `.env` file loading. Does NOT validate -- call
    /// [`validate`](Self::validate) before building clients.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer extra
    /// providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".mmrag/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("MMRAG_").split("__"))
    }

    /// Check every section, failing fast on the first broken one.
    ///
    /// Identity settings are mandatory: without them sign-in cannot work, and
    /// nothing else in the client is usable signed-out.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` listing missing identity fields, or
    /// `ConfigError::InvalidValue` for malformed URLs and zero durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.identity.validate()?;
        self.api.validate()?;
        self.ui.validate()
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mmrag").join("config.toml"))
    }
}

/// Shared URL check: only absolute `http`/`https` URLs with a host are accepted.
pub(crate) fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{value}' is not an http(s) URL"),
        })?;

    if rest.split(['/', '?', '#']).next().unwrap_or("").is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{value}' has no host"),
        });
    }

    Ok(())
}
