use mmrag_auth::{IdentityClient, TokenProvider};
use serde::Serialize;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    /// An account is remembered from a previous sign-in.
    cached_account: bool,
    username: Option<String>,
    name: Option<String>,
    tenant_id: String,
    /// Where the cached session lives (`keyring` / `file`).
    session_source: Option<String>,
    /// A token could be obtained without prompting.
    silent_sign_in: bool,
    expires_at: Option<String>,
    note: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let client = ctx.tokens.client();
    let account = client.active_account();

    let mut status = AuthStatusResponse {
        cached_account: account.is_some(),
        username: account.as_ref().map(|a| a.username.clone()),
        name: account.as_ref().and_then(|a| a.name.clone()),
        tenant_id: ctx.config.identity.tenant_id.clone(),
        session_source: client.session_source().map(str::to_string),
        silent_sign_in: false,
        expires_at: None,
        note: None,
    };

    if account.is_none() {
        status.note = Some("no cached account; run `mmrag auth login`".into());
    } else {
        match ctx.tokens.acquire_silently().await {
            Ok(credential) => {
                status.silent_sign_in = true;
                status.expires_at = Some(credential.expires_at.to_rfc3339());
            }
            Err(error) => status.note = Some(format!("silent sign-in failed: {error}")),
        }
    }

    match flags.format {
        OutputFormat::Text => {
            print!("{}", render_text(&status));
            Ok(())
        }
        format => output(&status, format),
    }
}

fn render_text(status: &AuthStatusResponse) -> String {
    let mut lines = Vec::new();
    match (&status.username, status.silent_sign_in) {
        (Some(username), true) => lines.push(format!("Signed in as {username}.")),
        (Some(username), false) => lines.push(format!("Cached account {username} needs to sign in again.")),
        (None, _) => lines.push("Not signed in.".to_string()),
    }
    lines.push(format!("Tenant: {}", status.tenant_id));
    if let Some(source) = &status.session_source {
        lines.push(format!("Session cache: {source}"));
    }
    if let Some(expires_at) = &status.expires_at {
        lines.push(format!("Token expires: {expires_at}"));
    }
    if let Some(note) = &status.note {
        lines.push(format!("Note: {note}"));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{AuthStatusResponse, render_text};

    fn signed_out() -> AuthStatusResponse {
        AuthStatusResponse {
            cached_account: false,
            username: None,
            name: None,
            tenant_id: "contoso".into(),
            session_source: None,
            silent_sign_in: false,
            expires_at: None,
            note: Some("no cached account; run `mmrag auth login`".into()),
        }
    }

    #[test]
    fn signed_out_status_points_at_login() {
        assert_eq!(
            render_text(&signed_out()),
            "Not signed in.\nTenant: contoso\nNote: no cached account; run `mmrag auth login`\n"
        );
    }

    #[test]
    fn stale_cached_account_is_called_out() {
        let status = AuthStatusResponse {
            cached_account: true,
            username: Some("ada@contoso.com".into()),
            session_source: Some("file".into()),
            note: Some("silent sign-in failed: boom".into()),
            ..signed_out()
        };

        let text = render_text(&status);
        assert!(text.starts_with("Cached account ada@contoso.com needs to sign in again.\n"));
        assert!(text.contains("Session cache: file\n"));
    }
}
