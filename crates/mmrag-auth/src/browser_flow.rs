use base64::Engine as _;
use mmrag_config::IdentityConfig;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// PKCE verifier/challenge pair (RFC 7636, `S256`).
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Generate a fresh pair from 32 random bytes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InteractiveFailed` if the OS RNG is unavailable.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes)
            .map_err(|e| AuthError::InteractiveFailed(format!("failed to generate PKCE verifier: {e}")))?;
        let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        Ok(Self::from_verifier(verifier))
    }

    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Where the loopback server listens and which path carries the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackRedirect {
    pub bind_addr: String,
    pub path: String,
}

/// Split a registered redirect URI into a loopback bind address and path.
///
/// Only `http://localhost:<port>/...` and `http://127.0.0.1:<port>/...` can be
/// served by a CLI.
///
/// # Errors
///
/// Returns `AuthError::InvalidRedirectUri` for anything else.
pub fn parse_redirect_uri(uri: &str) -> Result<LoopbackRedirect, AuthError> {
    let invalid = |reason: &str| AuthError::InvalidRedirectUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    let url = reqwest::Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("loopback redirects must use http"));
    }
    match url.host_str() {
        Some("localhost" | "127.0.0.1") => {}
        _ => return Err(invalid("host must be localhost or 127.0.0.1")),
    }
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("no port"))?;

    Ok(LoopbackRedirect {
        bind_addr: format!("127.0.0.1:{port}"),
        path: url.path().to_string(),
    })
}

/// Build the `/authorize` URL for the authorization-code + PKCE flow.
#[must_use]
pub fn authorize_url(
    identity: &IdentityConfig,
    scopes: &[String],
    state: &str,
    code_challenge: &str,
) -> String {
    format!(
        "{authority}/oauth2/v2.0/authorize?client_id={client_id}&response_type=code&redirect_uri={redirect}&response_mode=query&scope={scope}&state={state}&code_challenge={challenge}&code_challenge_method=S256&prompt=select_account",
        authority = identity.authority(),
        client_id = urlencoding::encode(&identity.client_id),
        redirect = urlencoding::encode(&identity.redirect_uri),
        scope = urlencoding::encode(&scopes.join(" ")),
        state = urlencoding::encode(state),
        challenge = code_challenge,
    )
}

/// An authorization code together with the verifier that must redeem it.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub verifier: String,
}

/// Run the interactive browser sign-in up to the authorization code.
///
/// 1. Bind `tiny_http` on the redirect URI's loopback address
/// 2. Open the browser at the `/authorize` URL (printed as a fallback)
/// 3. Wait for the callback in `spawn_blocking`, since `tiny_http::recv` blocks
/// 4. Check the `state` nonce and return the code
///
/// # Errors
///
/// Returns `AuthError::InvalidRedirectUri` for a non-loopback redirect and
/// `AuthError::InteractiveFailed` if the server cannot bind, the user cancels,
/// or the callback times out.
pub async fn authorize(
    identity: &IdentityConfig,
    scopes: &[String],
) -> Result<AuthorizationCode, AuthError> {
    let redirect = parse_redirect_uri(&identity.redirect_uri)?;
    let server = tiny_http::Server::http(&redirect.bind_addr).map_err(|e| {
        AuthError::InteractiveFailed(format!("failed to bind {}: {e}", redirect.bind_addr))
    })?;

    let pkce = Pkce::generate()?;
    let state = random_state()?;
    let sign_in_url = authorize_url(identity, scopes, &state, &pkce.challenge);

    eprintln!("Opening browser to sign in: {sign_in_url}");
    if let Err(error) = open::that(&sign_in_url) {
        eprintln!("Failed to open browser: {error}");
        eprintln!("Open the URL above manually, then return here.");
    }

    let timeout = std::time::Duration::from_secs(identity.login_timeout_secs);
    let path = redirect.path;
    let code =
        tokio::task::spawn_blocking(move || wait_for_callback(&server, &path, timeout, &state))
            .await
            .map_err(|e| AuthError::InteractiveFailed(format!("spawn_blocking join: {e}")))??;

    Ok(AuthorizationCode {
        code,
        verifier: pkce.verifier,
    })
}

/// Random 16-byte hex nonce for CSRF protection.
fn random_state() -> Result<String, AuthError> {
    let mut nonce_bytes = [0u8; 16];
    getrandom::fill(&mut nonce_bytes)
        .map_err(|e| AuthError::InteractiveFailed(format!("failed to generate CSRF nonce: {e}")))?;
    Ok(nonce_bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Query parameters the identity provider may put on the callback.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub(crate) fn parse_callback(query: &str) -> Result<CallbackParams, AuthError> {
    let mut params = CallbackParams::default();
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let decoded = urlencoding::decode(&value.replace('+', " "))
            .map_err(|e| AuthError::InteractiveFailed(format!("URL decode: {e}")))?
            .into_owned();
        match key {
            "code" => params.code = Some(decoded),
            "state" => params.state = Some(decoded),
            "error" => params.error = Some(decoded),
            "error_description" => params.error_description = Some(decoded),
            _ => {}
        }
    }
    Ok(params)
}

fn html_response(body: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let response = tiny_http::Response::from_string(body);
    match tiny_http::Header::from_bytes("Content-Type", "text/html") {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

/// Block until the callback path receives a code or an error.
///
/// Requests to other paths (favicon, preflight) get `204` and are ignored.
fn wait_for_callback(
    server: &tiny_http::Server,
    callback_path: &str,
    timeout: std::time::Duration,
    expected_state: &str,
) -> Result<String, AuthError> {
    let deadline = std::time::Instant::now() + timeout;
    let timed_out = || {
        AuthError::InteractiveFailed(format!(
            "browser callback timed out after {}s",
            timeout.as_secs()
        ))
    };

    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            return Err(timed_out());
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(req)) => req,
            Ok(None) => return Err(timed_out()),
            Err(e) => return Err(AuthError::InteractiveFailed(format!("recv error: {e}"))),
        };

        let url = request.url().to_string();
        let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

        if path != callback_path {
            let _ = request.respond(tiny_http::Response::from_string("").with_status_code(204));
            continue;
        }

        let params = parse_callback(query)?;

        if params.state.as_deref() != Some(expected_state) {
            let _ = request.respond(html_response(
                "<html><body><h1>Sign-in failed</h1><p>State mismatch. Check the terminal.</p></body></html>",
            ));
            return Err(AuthError::InteractiveFailed(
                "state mismatch, possible CSRF".into(),
            ));
        }

        if let Some(error) = params.error {
            let _ = request.respond(html_response(
                "<html><body><h1>Sign-in failed</h1><p>Check the terminal for details.</p></body></html>",
            ));
            let description = params.error_description.unwrap_or_default();
            return Err(AuthError::InteractiveFailed(format!("{error}: {description}")));
        }

        match params.code {
            Some(code) => {
                let _ = request.respond(html_response(
                    "<html><body><h1>Signed in!</h1><p>You can close this tab.</p></body></html>",
                ));
                return Ok(code);
            }
            None => {
                let _ = request.respond(html_response(
                    "<html><body><h1>Waiting for sign-in…</h1><p>Redirecting, please wait.</p></body></html>",
                ));
            }
        }
    }
}
