//! # mmrag-auth
//!
//! Microsoft Entra ID sign-in for the mmrag client.
//!
//! Provides browser login (authorization code + PKCE over a `tiny_http`
//! loopback, opened with `open`), silent refresh through the refresh-token
//! grant, an OS keychain session cache (`keyring`) with a file fallback, and
//! the [`TokenProvider`] that owns the current bearer credential.

pub mod browser_flow;
pub mod claims;
pub mod error;
pub mod identity;
pub mod provider;
pub mod session_store;
pub mod token_endpoint;

pub use error::AuthError;
pub use identity::{EntraIdentityClient, IdentityClient};
pub use provider::{IdentityTokenProvider, TokenProvider, spawn_silent_warmup};
pub use session_store::{SessionStore, StoredSession};

use mmrag_config::IdentityConfig;

/// Token provider backed by Entra ID and the default session cache.
///
/// # Errors
///
/// Returns `AuthError::Other` if the HTTP client cannot be built.
pub fn entra_provider(
    config: &IdentityConfig,
) -> Result<IdentityTokenProvider<EntraIdentityClient>, AuthError> {
    let scopes = config.scopes();
    let client = EntraIdentityClient::new(config.clone(), SessionStore::new())?;
    Ok(IdentityTokenProvider::new(client, scopes))
}
