//! RAG backend endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Default request timeout; answer generation routinely takes minutes.
const fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Backend base URL; `/query` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Full indexing endpoint URL. Empty means `{base_url}/index_new_documents`.
    #[serde(default)]
    pub index_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// URL of the query endpoint.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }

    /// URL of the indexing endpoint.
    #[must_use]
    pub fn index_url(&self) -> String {
        if self.index_url.is_empty() {
            format!("{}/index_new_documents", self.base_url.trim_end_matches('/'))
        } else {
            self.index_url.clone()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        crate::check_http_url("api.base_url", &self.base_url)?;
        if !self.index_url.is_empty() {
            crate::check_http_url("api.index_url", &self.index_url)?;
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
