//! Organizational identity provider (Microsoft Entra ID) configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

/// Default time to wait for the browser callback.
const fn default_login_timeout_secs() -> u64 {
    120
}

/// Identity scopes requested alongside the API scope.
pub const STANDARD_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Directory (tenant) id.
    #[serde(default)]
    pub tenant_id: String,

    /// Application (client) id of the registered public client.
    #[serde(default)]
    pub client_id: String,

    /// Registered redirect URI, e.g. `http://localhost:3000/callback`.
    #[serde(default)]
    pub redirect_uri: String,

    /// Scope exposed by the backend API, e.g. `api://<app-id>/access_as_user`.
    #[serde(default)]
    pub api_scope: String,

    /// Authority host; override for sovereign clouds or tests.
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Seconds to wait for the browser sign-in callback.
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            redirect_uri: String::new(),
            api_scope: String::new(),
            authority_host: default_authority_host(),
            login_timeout_secs: default_login_timeout_secs(),
        }
    }
}

impl IdentityConfig {
    /// Check if every field needed for sign-in is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// `{authority_host}/{tenant_id}`.
    #[must_use]
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// The fixed scope set requested at sign-in: API scope first.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        std::iter::once(self.api_scope.clone())
            .chain(STANDARD_SCOPES.iter().map(|s| (*s).to_string()))
            .collect()
    }

    fn missing_fields(&self) -> Vec<String> {
        [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("api_scope", &self.api_scope),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "identity".into(),
                missing,
            });
        }
        crate::check_http_url("identity.authority_host", &self.authority_host)?;
        crate::check_http_url("identity.redirect_uri", &self.redirect_uri)?;
        if self.login_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "identity.login_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
