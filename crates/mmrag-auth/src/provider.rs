use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use mmrag_core::Credential;
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::identity::IdentityClient;

/// Source of bearer credentials for the query and indexing flows.
///
/// Only implementations write the stored credential; everyone else reads it
/// through [`current`](Self::current).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The stored credential, if any. Never blocks.
    fn current(&self) -> Option<Credential>;

    /// Whether the identity cache remembers a signed-in account.
    fn has_active_account(&self) -> bool;

    /// Interactive sign-in. On failure the stored credential is unchanged.
    async fn sign_in(&self) -> Result<Credential, AuthError>;

    /// Refresh without user interaction using the active account.
    async fn acquire_silently(&self) -> Result<Credential, AuthError>;

    /// Silent acquisition, falling back to interactive sign-in.
    ///
    /// On success the stored credential is atomically replaced; on failure the
    /// previous credential (if any) is left untouched.
    async fn refresh(&self) -> Result<Credential, AuthError> {
        match self.acquire_silently().await {
            Ok(credential) => Ok(credential),
            Err(error) => {
                tracing::debug!(%error, "silent acquisition failed; falling back to interactive sign-in");
                self.sign_in().await
            }
        }
    }
}

/// [`TokenProvider`] over an identity SDK, holding the credential in an
/// [`ArcSwapOption`] so readers never see a half-written value.
pub struct IdentityTokenProvider<C> {
    client: C,
    scopes: Vec<String>,
    credential: ArcSwapOption<Credential>,
}

impl<C: IdentityClient> IdentityTokenProvider<C> {
    /// `scopes` is the fixed set requested on every acquisition.
    #[must_use]
    pub fn new(client: C, scopes: Vec<String>) -> Self {
        Self {
            client,
            scopes,
            credential: ArcSwapOption::empty(),
        }
    }

    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    fn install(&self, credential: Credential) -> Credential {
        self.credential.store(Some(Arc::new(credential.clone())));
        credential
    }
}

#[async_trait]
impl<C: IdentityClient> TokenProvider for IdentityTokenProvider<C> {
    fn current(&self) -> Option<Credential> {
        self.credential.load_full().map(|credential| (*credential).clone())
    }

    fn has_active_account(&self) -> bool {
        self.credential.load().is_some() || self.client.active_account().is_some()
    }

    async fn sign_in(&self) -> Result<Credential, AuthError> {
        let credential = self.client.acquire_token_interactive(&self.scopes).await?;
        Ok(self.install(credential))
    }

    async fn acquire_silently(&self) -> Result<Credential, AuthError> {
        let account = self
            .current()
            .map(|credential| credential.account)
            .or_else(|| self.client.active_account())
            .ok_or_else(|| AuthError::SilentUnavailable("no signed-in account".into()))?;

        let credential = self.client.acquire_token_silent(&account, &self.scopes).await?;
        Ok(self.install(credential))
    }
}

/// On startup, if an account is remembered, try one silent acquisition in
/// the background so the first query does not wait on the identity provider.
///
/// Returns `None` when there is nothing to warm up.
pub fn spawn_silent_warmup(provider: Arc<dyn TokenProvider>) -> Option<JoinHandle<()>> {
    if !provider.has_active_account() {
        return None;
    }

    Some(tokio::spawn(async move {
        match provider.acquire_silently().await {
            Ok(credential) => {
                tracing::debug!(account = %credential.account.username, "silent sign-in succeeded");
            }
            Err(error) => {
                tracing::debug!(%error, "silent sign-in unavailable; waiting for interactive sign-in");
            }
        }
    }))
}
