use base64::Engine as _;
use mmrag_core::Account;
use serde::Deserialize;

use crate::error::AuthError;

/// Subset of the Entra ID id-token claims needed to describe the account.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    tid: String,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// The id token arrives straight from the token endpoint over TLS, which is
/// what MSAL relies on too; nothing here is used for authorization.
///
/// # Errors
///
/// Returns `AuthError::Other` if the JWT format, base64, or JSON is invalid.
pub fn decode_payload(jwt: &str) -> Result<serde_json::Value, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::Other("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::Other(format!("base64 decode failed: {e}")))?;
    serde_json::from_slice(&payload).map_err(|e| AuthError::Other(format!("JSON parse failed: {e}")))
}

/// Build the [`Account`] described by an id token.
///
/// # Errors
///
/// Returns `AuthError::Other` if the token cannot be decoded or lacks `tid`
/// and a subject (`oid` or `sub`).
pub fn account_from_id_token(id_token: &str) -> Result<Account, AuthError> {
    let claims: IdTokenClaims = serde_json::from_value(decode_payload(id_token)?)
        .map_err(|e| AuthError::Other(format!("id token claims: {e}")))?;

    let object_id = claims
        .oid
        .or(claims.sub)
        .ok_or_else(|| AuthError::Other("id token has neither oid nor sub".into()))?;

    let username = claims
        .preferred_username
        .or(claims.email)
        .unwrap_or_else(|| object_id.clone());

    Ok(Account {
        home_account_id: format!("{object_id}.{}", claims.tid),
        username,
        name: claims.name,
        tenant_id: claims.tid,
    })
}

/// Decode the `exp` claim of a JWT (for tokens issued without `expires_in`).
///
/// # Errors
///
/// Returns `AuthError::Other` if the JWT format is invalid or the `exp` claim
/// is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<chrono::DateTime<chrono::Utc>, AuthError> {
    let value = decode_payload(jwt)?;
    let exp = value["exp"]
        .as_i64()
        .ok_or_else(|| AuthError::Other("missing exp claim".into()))?;
    chrono::DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::Other("invalid exp timestamp".into()))
}

/// Helper for tests across the crate: an unsigned JWT with the given payload.
#[cfg(test)]
pub(crate) fn fake_jwt(payload: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let body = engine.encode(payload.to_string());
    let signature = engine.encode("fake_sig");
    format!("{header}.{body}.{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn account_from_full_id_token() {
        let jwt = fake_jwt(&json!({
            "oid": "00000000-aaaa",
            "tid": "contoso-tenant",
            "preferred_username": "ada@contoso.com",
            "name": "Ada Lovelace",
        }));
        let account = account_from_id_token(&jwt).unwrap();
        assert_eq!(
            account,
            Account {
                home_account_id: "00000000-aaaa.contoso-tenant".into(),
                username: "ada@contoso.com".into(),
                name: Some("Ada Lovelace".into()),
                tenant_id: "contoso-tenant".into(),
            }
        );
    }

    #[test]
    fn account_falls_back_to_sub_and_email() {
        let jwt = fake_jwt(&json!({
            "sub": "subject-1",
            "tid": "t",
            "email": "grace@contoso.com",
        }));
        let account = account_from_id_token(&jwt).unwrap();
        assert_eq!(account.home_account_id, "subject-1.t");
        assert_eq!(account.username, "grace@contoso.com");
        assert!(account.name.is_none());
    }

    #[test]
    fn account_requires_subject() {
        let jwt = fake_jwt(&json!({"tid": "t"}));
        let err = account_from_id_token(&jwt).unwrap_err();
        assert!(err.to_string().contains("neither oid nor sub"));
    }

    #[test]
    fn decode_expiry_valid_jwt() {
        let future_exp = chrono::Utc::now().timestamp() + 3600;
        let jwt = fake_jwt(&json!({"sub": "user_123", "exp": future_exp}));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), future_exp);
    }

    #[test]
    fn decode_expiry_missing_exp_claim() {
        let jwt = fake_jwt(&json!({"sub": "user_123"}));
        let err = decode_expiry(&jwt).unwrap_err();
        assert!(err.to_string().contains("missing exp claim"));
    }

    #[test]
    fn decode_payload_invalid_format() {
        let err = decode_payload("not-a-jwt").unwrap_err();
        assert!(err.to_string().contains("invalid JWT format"));
    }

    #[test]
    fn decode_payload_bad_base64() {
        let err = decode_payload("header.!!!invalid!!!.signature").unwrap_err();
        assert!(err.to_string().contains("base64 decode failed"));
    }
}
