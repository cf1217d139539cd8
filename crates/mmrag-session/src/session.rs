//! One signed-in client session: tokens, queries, indexing and what to show.

use std::sync::Arc;
use std::time::Duration;

use mmrag_auth::{TokenProvider, spawn_silent_warmup};
use mmrag_client::RagBackend;
use mmrag_config::UiConfig;
use mmrag_core::Account;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::controller::QueryController;
use crate::error::SessionError;
use crate::indexing::{IndexingState, IndexingTrigger};
use crate::machine::QueryRequestState;
use crate::notify::{Notification, Notifier};

/// Everything the presentation layer renders, captured at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub account: Option<Account>,
    pub query: QueryRequestState,
    pub indexing: IndexingState,
    pub dots: String,
    pub elapsed: Duration,
}

impl SessionView {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.account.is_some()
    }
}

/// Wires one [`TokenProvider`] and one [`RagBackend`] into the query and
/// indexing flows. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    tokens: Arc<dyn TokenProvider>,
    notifier: Notifier,
    queries: QueryController,
    indexing: IndexingTrigger,
    account: Arc<watch::Sender<Option<Account>>>,
}

impl Session {
    #[must_use]
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        backend: Arc<dyn RagBackend>,
        notifier: Notifier,
        ui: &UiConfig,
    ) -> Self {
        let queries = QueryController::new(
            Arc::clone(&tokens),
            Arc::clone(&backend),
            notifier.clone(),
            ui,
        );
        let indexing = IndexingTrigger::new(Arc::clone(&tokens), backend, notifier.clone());
        let (account, _) = watch::channel(tokens.current().map(|c| c.account));
        Self {
            tokens,
            notifier,
            queries,
            indexing,
            account: Arc::new(account),
        }
    }

    /// Background silent sign-in when an account is remembered.
    pub fn warm_up(&self) -> Option<JoinHandle<()>> {
        let warmup = spawn_silent_warmup(Arc::clone(&self.tokens))?;
        let session = self.clone();
        Some(tokio::spawn(async move {
            if let Err(error) = warmup.await {
                tracing::debug!(%error, "silent sign-in task did not finish");
            }
            session.sync_account();
        }))
    }

    /// Interactive sign-in. Failures are also sent to the notifier.
    ///
    /// # Errors
    ///
    /// `SessionError::Auth` if sign-in failed or was dismissed.
    pub async fn sign_in(&self) -> Result<Account, SessionError> {
        match self.tokens.sign_in().await {
            Ok(credential) => {
                self.sync_account();
                self.notifier.notify(Notification::info(format!(
                    "Signed in as {}.",
                    credential.account.label()
                )));
                Ok(credential.account)
            }
            Err(error) => {
                let error = SessionError::from(error);
                self.notifier.notify(error.notification());
                Err(error)
            }
        }
    }

    /// See [`QueryController::submit`].
    ///
    /// # Errors
    ///
    /// `SessionError::Unauthenticated` without a credential.
    pub async fn submit(&self, query: impl Into<String>) -> Result<u64, SessionError> {
        let generation = self.queries.submit(query).await?;

        // The query path may refresh the credential, possibly for another
        // account; republish the account once this request settles.
        let session = self.clone();
        let mut states = self.queries.subscribe();
        tokio::spawn(async move {
            let settled = states
                .wait_for(|state| state.generation != generation || state.phase.is_settled())
                .await
                .is_ok();
            if settled {
                session.sync_account();
            }
        });

        Ok(generation)
    }

    /// See [`IndexingTrigger::trigger`].
    ///
    /// # Errors
    ///
    /// Whatever the indexing pass failed with.
    pub async fn trigger_indexing(&self) -> Result<Map<String, Value>, SessionError> {
        let result = self.indexing.trigger().await;
        self.sync_account();
        result
    }

    #[must_use]
    pub const fn queries(&self) -> &QueryController {
        &self.queries
    }

    #[must_use]
    pub const fn indexing(&self) -> &IndexingTrigger {
        &self.indexing
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            account: self.tokens.current().map(|c| c.account),
            query: self.queries.state(),
            indexing: self.indexing.state(),
            dots: self.queries.dots().borrow().clone(),
            elapsed: *self.queries.elapsed().borrow(),
        }
    }

    /// Receivers for every input of [`view`](Self::view).
    #[must_use]
    pub fn watch(&self) -> SessionWatch {
        SessionWatch {
            account: self.account.subscribe(),
            query: self.queries.subscribe(),
            indexing: self.indexing.subscribe(),
            dots: self.queries.dots(),
            elapsed: self.queries.elapsed(),
        }
    }

    fn sync_account(&self) {
        let current = self.tokens.current().map(|c| c.account);
        self.account.send_if_modified(|account| {
            if *account == current {
                false
            } else {
                *account = current;
                true
            }
        });
    }
}

/// Waits for any change to a [`Session`]'s view.
#[derive(Debug)]
pub struct SessionWatch {
    account: watch::Receiver<Option<Account>>,
    query: watch::Receiver<QueryRequestState>,
    indexing: watch::Receiver<IndexingState>,
    dots: watch::Receiver<String>,
    elapsed: watch::Receiver<Duration>,
}

impl SessionWatch {
    /// Resolve on the next change. Returns `false` once the session is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            r = self.account.changed() => r.is_ok(),
            r = self.query.changed() => r.is_ok(),
            r = self.indexing.changed() => r.is_ok(),
            r = self.dots.changed() => r.is_ok(),
            r = self.elapsed.changed() => r.is_ok(),
        }
    }

    /// Resolve on the next change of the signed-in account only.
    pub async fn account_changed(&mut self) -> Option<Option<Account>> {
        self.account.changed().await.ok()?;
        Some(self.account.borrow_and_update().clone())
    }

    /// Resolve on the next change of the query state only.
    pub async fn query_changed(&mut self) -> Option<QueryRequestState> {
        self.query.changed().await.ok()?;
        Some(self.query.borrow_and_update().clone())
    }
}
