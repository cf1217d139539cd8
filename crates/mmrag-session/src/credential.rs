use mmrag_auth::TokenProvider;
use mmrag_core::Credential;

use crate::error::SessionError;

/// Refresh credentials that expire within this many seconds before using them.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// The stored credential, refreshed first when it is about to expire.
///
/// # Errors
///
/// `SessionError::Unauthenticated` without a credential; `SessionError::Auth`
/// when the refresh fails.
pub async fn fresh_credential(tokens: &dyn TokenProvider) -> Result<Credential, SessionError> {
    let credential = tokens.current().ok_or(SessionError::Unauthenticated)?;
    if !credential.is_near_expiry(REFRESH_MARGIN_SECS) {
        return Ok(credential);
    }
    tracing::debug!(expires_at = %credential.expires_at, "credential near expiry; refreshing");
    Ok(tokens.refresh().await?)
}
