//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use mmrag_config::MmragConfig;

#[test]
fn loads_api_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[api]
base_url = "http://4.227.76.55"
index_url = "http://4.227.76.55/admin/index"
timeout_secs = 90
"#,
        )?;

        let config: MmragConfig = Figment::from(Serialized::defaults(MmragConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.api.query_url(), "http://4.227.76.55/query");
        assert_eq!(config.api.index_url(), "http://4.227.76.55/admin/index");
        assert_eq!(config.api.timeout_secs, 90);
        Ok(())
    });
}

#[test]
fn loads_identity_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[identity]
tenant_id = "contoso-tenant"
client_id = "client-123"
redirect_uri = "http://localhost:3000/callback"
api_scope = "api://rag/access_as_user"
"#,
        )?;

        let config: MmragConfig = Figment::from(Serialized::defaults(MmragConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(config.identity.is_configured());
        assert_eq!(
            config.identity.authority(),
            "https://login.microsoftonline.com/contoso-tenant"
        );
        assert_eq!(config.identity.login_timeout_secs, 120);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".mmrag")?;
        jail.create_file(
            ".mmrag/config.toml",
            r#"
[ui]
dots_period_ms = 250
"#,
        )?;

        let config = MmragConfig::load().expect("config loads");
        assert_eq!(config.ui.dots_period_ms, 250);
        assert_eq!(config.ui.clock_period_ms, 10);
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[identity]
tenant_id = "only-tenant"
"#,
        )?;

        let config: MmragConfig = Figment::from(Serialized::defaults(MmragConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.identity.tenant_id, "only-tenant");
        assert_eq!(
            config.identity.authority_host,
            "https://login.microsoftonline.com"
        );
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert!(config.validate().is_err());
        Ok(())
    });
}
