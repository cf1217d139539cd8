//! OAuth 2.0 token endpoint grants (`authorization_code`, `refresh_token`).

use chrono::{DateTime, Utc};
use mmrag_core::{Account, Credential};
use serde::Deserialize;

use crate::error::AuthError;

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: String,
}

impl TokenResponse {
    /// Build a [`Credential`] for `account`.
    ///
    /// Granted scopes fall back to `requested` when the endpoint omits them;
    /// expiry falls back to the access token's own `exp` claim.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Other` when no expiry can be determined.
    pub fn to_credential(
        &self,
        account: Account,
        requested: &[String],
    ) -> Result<Credential, AuthError> {
        let expires_at: DateTime<Utc> = match self.expires_in {
            Some(secs) => Utc::now() + chrono::TimeDelta::seconds(secs),
            None => crate::claims::decode_expiry(&self.access_token)
                .map_err(|e| AuthError::Other(format!("token response has no expiry: {e}")))?,
        };

        let scopes = self.scope.as_deref().map_or_else(
            || requested.to_vec(),
            |granted| granted.split_whitespace().map(String::from).collect(),
        );

        Ok(Credential {
            access_token: self.access_token.clone(),
            scopes,
            expires_at,
            account,
        })
    }
}

/// Client for `{authority}/oauth2/v2.0/token`.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http: reqwest::Client,
    url: String,
    client_id: String,
}

impl TokenEndpoint {
    #[must_use]
    pub fn new(http: reqwest::Client, authority: &str, client_id: &str) -> Self {
        Self {
            http,
            url: format!("{}/oauth2/v2.0/token", authority.trim_end_matches('/')),
            client_id: client_id.to_string(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Redeem an authorization code obtained by the browser flow.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEndpoint` on an OAuth error response and
    /// `AuthError::Transport` when the endpoint cannot be reached or parsed.
    pub async fn redeem_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
        scopes: &[String],
    ) -> Result<TokenResponse, AuthError> {
        let scope = scopes.join(" ");
        self.post(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
            ("scope", scope.as_str()),
        ])
        .await
    }

    /// Exchange a cached refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEndpoint` on an OAuth error response (check
    /// [`AuthError::requires_interaction`]) and `AuthError::Transport` when
    /// the endpoint cannot be reached or parsed.
    pub async fn redeem_refresh_token(
        &self,
        refresh_token: &str,
        scopes: &[String],
    ) -> Result<TokenResponse, AuthError> {
        let scope = scopes.join(" ");
        self.post(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", scope.as_str()),
        ])
        .await
    }

    async fn post(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.url)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<TokenResponse>()
                .await
                .map_err(|e| AuthError::Transport(format!("parse token response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenErrorBody>(&body) {
            Ok(parsed) => Err(AuthError::TokenEndpoint {
                error: parsed.error,
                description: parsed.error_description,
            }),
            Err(_) => Err(AuthError::TokenEndpoint {
                error: status.as_u16().to_string(),
                description: body,
            }),
        }
    }
}
