use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in account as reported by the identity provider.
///
/// Produced by `mmrag-auth` from id-token claims, cached alongside the refresh
/// token, and shown by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// `{oid}.{tid}`; stable across sign-ins.
    pub home_account_id: String,
    /// `preferred_username` claim (usually the UPN / e-mail).
    pub username: String,
    /// `name` claim, when the directory provides one.
    #[serde(default)]
    pub name: Option<String>,
    /// Directory (tenant) id, from the `tid` claim.
    pub tenant_id: String,
}

impl Account {
    /// Human-facing label: display name when present, else the username.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// A bearer credential for the RAG backend.
///
/// Replaced wholesale on every refresh; never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Raw access token, sent as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Scopes granted with this token.
    pub scopes: Vec<String>,
    /// Expiry reported by the token endpoint.
    pub expires_at: DateTime<Utc>,
    /// Account the token was issued to.
    pub account: Account,
}

impl Credential {
    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at <= threshold
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .field("account", &self.account)
            .finish()
    }
}
