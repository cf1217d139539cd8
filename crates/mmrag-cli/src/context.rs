use std::sync::Arc;

use anyhow::Context;
use mmrag_auth::{EntraIdentityClient, IdentityTokenProvider};
use mmrag_client::HttpBackend;
use mmrag_config::MmragConfig;
use mmrag_session::{Notification, Notifier, Session};
use tokio::sync::mpsc::UnboundedReceiver;

/// Everything a command handler needs, built once from validated config.
pub struct AppContext {
    pub config: MmragConfig,
    pub tokens: Arc<IdentityTokenProvider<EntraIdentityClient>>,
    pub session: Session,
    pub notifications: UnboundedReceiver<Notification>,
}

impl AppContext {
    pub fn init(config: MmragConfig) -> anyhow::Result<Self> {
        let tokens = Arc::new(
            mmrag_auth::entra_provider(&config.identity)
                .context("failed to initialize the identity client")?,
        );
        let backend =
            Arc::new(HttpBackend::new(&config.api).context("failed to initialize the backend client")?);
        tracing::debug!(query_url = backend.query_url(), "backend client ready");

        let (notifier, notifications) = Notifier::channel();
        let session = Session::new(tokens.clone(), backend, notifier, &config.ui);

        Ok(Self {
            config,
            tokens,
            session,
            notifications,
        })
    }

    /// Restore a remembered account without prompting, and wait for it.
    pub async fn warm_up(&self) {
        if let Some(warmup) = self.session.warm_up()
            && let Err(error) = warmup.await
        {
            tracing::debug!(%error, "silent sign-in task did not finish");
        }
    }

    /// Notifications queued so far, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }
}
