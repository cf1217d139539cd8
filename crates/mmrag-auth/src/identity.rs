//! The identity-provider seam and its Microsoft Entra ID implementation.

use std::time::Duration;

use async_trait::async_trait;
use mmrag_config::IdentityConfig;
use mmrag_core::{Account, Credential};

use crate::error::AuthError;
use crate::session_store::{SessionStore, StoredSession};
use crate::token_endpoint::{TokenEndpoint, TokenResponse};

/// Timeout for token endpoint calls (not the browser wait).
const TOKEN_HTTP_TIMEOUT_SECS: u64 = 30;

/// What [`crate::IdentityTokenProvider`] needs from an identity SDK.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// The account remembered from a previous sign-in, if any.
    fn active_account(&self) -> Option<Account>;

    /// Full interactive sign-in for `scopes`.
    async fn acquire_token_interactive(&self, scopes: &[String]) -> Result<Credential, AuthError>;

    /// Token for `account` without user interaction.
    ///
    /// Fails with `AuthError::SilentUnavailable` when the provider needs the
    /// user (no cached session, expired or revoked refresh token).
    async fn acquire_token_silent(
        &self,
        account: &Account,
        scopes: &[String],
    ) -> Result<Credential, AuthError>;
}

/// Public-client sign-in against the Microsoft identity platform (v2 endpoints).
#[derive(Debug)]
pub struct EntraIdentityClient {
    config: IdentityConfig,
    endpoint: TokenEndpoint,
    store: SessionStore,
}

impl EntraIdentityClient {
    /// # Errors
    ///
    /// Returns `AuthError::Other` if the HTTP client cannot be built.
    pub fn new(config: IdentityConfig, store: SessionStore) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOKEN_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Other(format!("failed to build HTTP client: {e}")))?;
        let endpoint = TokenEndpoint::new(http, &config.authority(), &config.client_id);
        Ok(Self {
            config,
            endpoint,
            store,
        })
    }

    /// Where the cached session lives (`keyring` / `file`), for status output.
    #[must_use]
    pub fn session_source(&self) -> Option<&'static str> {
        self.store.detect_source()
    }

    /// Persist the (possibly rotated) refresh token. A failure here only costs
    /// the next run its silent sign-in, so it is logged, not returned.
    fn remember(&self, account: &Account, refresh_token: Option<&str>) {
        let Some(refresh_token) = refresh_token else {
            return;
        };
        let session = StoredSession {
            account: account.clone(),
            refresh_token: refresh_token.to_string(),
        };
        if let Err(error) = self.store.store(&session) {
            tracing::warn!(%error, "could not cache identity session; next run will prompt");
        }
    }

    fn credential_from(
        &self,
        response: &TokenResponse,
        fallback_account: Option<&Account>,
        scopes: &[String],
    ) -> Result<Credential, AuthError> {
        let account = match (&response.id_token, fallback_account) {
            (Some(id_token), _) => crate::claims::account_from_id_token(id_token)?,
            (None, Some(account)) => account.clone(),
            (None, None) => {
                return Err(AuthError::Other(
                    "token response carried no id_token; request the openid scope".into(),
                ));
            }
        };
        self.remember(&account, response.refresh_token.as_deref());
        response.to_credential(account, scopes)
    }
}

#[async_trait]
impl IdentityClient for EntraIdentityClient {
    fn active_account(&self) -> Option<Account> {
        self.store.load().map(|session| session.account)
    }

    async fn acquire_token_interactive(&self, scopes: &[String]) -> Result<Credential, AuthError> {
        let code = crate::browser_flow::authorize(&self.config, scopes).await?;
        let response = self
            .endpoint
            .redeem_code(&code.code, &self.config.redirect_uri, &code.verifier, scopes)
            .await
            .map_err(|e| AuthError::InteractiveFailed(format!("code redemption: {e}")))?;
        let credential = self.credential_from(&response, None, scopes)?;
        tracing::info!(account = %credential.account.username, "signed in");
        Ok(credential)
    }

    async fn acquire_token_silent(
        &self,
        account: &Account,
        scopes: &[String],
    ) -> Result<Credential, AuthError> {
        let session = self
            .store
            .load()
            .ok_or_else(|| AuthError::SilentUnavailable("no cached session".into()))?;

        if session.account.home_account_id != account.home_account_id {
            return Err(AuthError::SilentUnavailable(
                "cached session belongs to a different account".into(),
            ));
        }

        let response = self
            .endpoint
            .redeem_refresh_token(&session.refresh_token, scopes)
            .await
            .map_err(|error| {
                if error.requires_interaction() {
                    AuthError::SilentUnavailable(error.to_string())
                } else {
                    error
                }
            })?;

        self.credential_from(&response, Some(&session.account), scopes)
    }
}
