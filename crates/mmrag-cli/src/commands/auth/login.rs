use anyhow::Context;
use mmrag_auth::TokenProvider;
use serde::Serialize;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    authenticated: bool,
    username: String,
    name: Option<String>,
    tenant_id: String,
    expires_at: String,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    if flags.format == OutputFormat::Text {
        eprintln!("Opening the browser to sign in...");
    }
    let credential = ctx
        .tokens
        .sign_in()
        .await
        .context("auth login: interactive sign-in failed")?;
    let account = credential.account;

    match flags.format {
        OutputFormat::Text => {
            println!("Signed in as {} ({}).", account.label(), account.username);
            Ok(())
        }
        format => output(
            &AuthLoginResponse {
                authenticated: true,
                username: account.username,
                name: account.name,
                tenant_id: account.tenant_id,
                expires_at: credential.expires_at.to_rfc3339(),
            },
            format,
        ),
    }
}
