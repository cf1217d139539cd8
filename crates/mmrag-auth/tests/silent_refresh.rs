//! # Integration tests for mmrag-auth
//!
//! Drive the silent path of [`EntraIdentityClient`] end to end against a
//! `wiremock` token endpoint and a file-only session cache, then exercise the
//! [`IdentityTokenProvider`] on top of it.
//!
//! ## Run
//!
//! ```bash
//! cargo test -p mmrag-auth --test silent_refresh
//! ```

use std::sync::Arc;

use base64::Engine as _;
use mmrag_auth::{
    AuthError, EntraIdentityClient, IdentityClient, IdentityTokenProvider, SessionStore,
    StoredSession, TokenProvider, spawn_silent_warmup,
};
use mmrag_config::IdentityConfig;
use mmrag_core::Account;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";

fn unsigned_jwt(claims: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.sig",
        engine.encode(br#"{"alg":"none","typ":"JWT"}"#),
        engine.encode(claims.to_string())
    )
}

fn identity(server: &MockServer) -> IdentityConfig {
    IdentityConfig {
        tenant_id: "contoso".into(),
        client_id: "client-123".into(),
        redirect_uri: "http://localhost:3000/callback".into(),
        api_scope: "api://rag/access_as_user".into(),
        authority_host: server.uri(),
        ..Default::default()
    }
}

fn account() -> Account {
    Account {
        home_account_id: "oid-1.tid-1".into(),
        username: "ada@contoso.com".into(),
        name: Some("Ada Lovelace".into()),
        tenant_id: "tid-1".into(),
    }
}

fn seeded_store(dir: &tempfile::TempDir, refresh_token: &str) -> SessionStore {
    let store = SessionStore::file_only(dir.path().join("session.json"));
    store
        .store(&StoredSession {
            account: account(),
            refresh_token: refresh_token.into(),
        })
        .expect("seed session");
    store
}

fn token_body(access_token: &str, refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "access_token": access_token,
        "expires_in": 3599,
        "refresh_token": refresh_token,
        "scope": "api://rag/access_as_user openid profile offline_access",
        "id_token": unsigned_jwt(&serde_json::json!({
            "oid": "oid-1",
            "tid": "tid-1",
            "preferred_username": "ada@contoso.com",
            "name": "Ada Lovelace",
        })),
    })
}

// ---------------------------------------------------------------------------
// EntraIdentityClient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remembered_account_comes_from_session_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();

    let empty = EntraIdentityClient::new(
        identity(&server),
        SessionStore::file_only(dir.path().join("none.json")),
    )
    .unwrap();
    assert!(empty.active_account().is_none());
    assert!(empty.session_source().is_none());

    let client = EntraIdentityClient::new(identity(&server), seeded_store(&dir, "rt-1")).unwrap();
    assert_eq!(client.active_account(), Some(account()));
    assert_eq!(client.session_source(), Some("file"));
}

#[tokio::test]
async fn silent_acquisition_rotates_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2", "rt-2")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let store = seeded_store(&dir, "rt-1");
    let client = EntraIdentityClient::new(identity(&server), store.clone()).unwrap();

    let scopes = identity(&server).scopes();
    let credential = client.acquire_token_silent(&account(), &scopes).await.unwrap();

    assert_eq!(credential.access_token, "at-2");
    assert_eq!(credential.account, account());
    assert_eq!(credential.scopes, scopes);
    assert!(!credential.is_near_expiry(60));
    assert_eq!(store.load().map(|s| s.refresh_token), Some("rt-2".into()));
}

#[tokio::test]
async fn expired_refresh_token_needs_interaction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "AADSTS700082: The refresh token has expired due to inactivity.",
        })))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let client = EntraIdentityClient::new(identity(&server), seeded_store(&dir, "rt-old")).unwrap();

    let err = client
        .acquire_token_silent(&account(), &identity(&server).scopes())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SilentUnavailable(_)));
    assert!(err.to_string().contains("AADSTS700082"));
}

#[tokio::test]
async fn session_for_another_account_is_not_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at", "rt")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let client = EntraIdentityClient::new(identity(&server), seeded_store(&dir, "rt-1")).unwrap();

    let stranger = Account {
        home_account_id: "someone.else".into(),
        ..account()
    };
    let err = client
        .acquire_token_silent(&stranger, &identity(&server).scopes())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SilentUnavailable(_)));
}

// ---------------------------------------------------------------------------
// IdentityTokenProvider over Entra
// ---------------------------------------------------------------------------

#[tokio::test]
async fn warmup_installs_credential_from_cached_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-warm", "rt-2")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let config = identity(&server);
    let client = EntraIdentityClient::new(config.clone(), seeded_store(&dir, "rt-1")).unwrap();
    let provider = Arc::new(IdentityTokenProvider::new(client, config.scopes()));
    assert!(provider.has_active_account());
    assert!(provider.current().is_none());

    let handle = spawn_silent_warmup(provider.clone()).expect("account is cached");
    handle.await.unwrap();

    let current = provider.current().expect("credential installed");
    assert_eq!(current.access_token, "at-warm");
}
