//! Document indexing trigger.

use std::sync::Arc;

use mmrag_auth::TokenProvider;
use mmrag_client::RagBackend;
use mmrag_core::IndexingPhase;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::credential::fresh_credential;
use crate::error::SessionError;
use crate::notify::Notifier;

/// Failure recorded when a pass is abandoned before the backend answers.
pub const INTERRUPTED: &str = "Indexing was interrupted.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexingState {
    pub phase: IndexingPhase,
    /// `document_summary_dict` of the last successful run.
    pub summary: Option<Map<String, Value>>,
    pub failure: Option<String>,
}

/// Asks the backend to index new documents. Shares only the credential with
/// the query flow, so both can run at once.
#[derive(Clone)]
pub struct IndexingTrigger {
    tokens: Arc<dyn TokenProvider>,
    backend: Arc<dyn RagBackend>,
    notifier: Notifier,
    state: Arc<watch::Sender<IndexingState>>,
}

impl IndexingTrigger {
    #[must_use]
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        backend: Arc<dyn RagBackend>,
        notifier: Notifier,
    ) -> Self {
        let (state, _) = watch::channel(IndexingState::default());
        Self {
            tokens,
            backend,
            notifier,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn state(&self) -> IndexingState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IndexingState> {
        self.state.subscribe()
    }

    /// Run one indexing pass and return the per-document summary.
    ///
    /// # Errors
    ///
    /// `SessionError::Unauthenticated` without a credential (no request is
    /// made), `SessionError::IndexingBusy` while a pass is running, and the
    /// backend or auth error of a failed pass. Every error is also sent to
    /// the notifier.
    pub async fn trigger(&self) -> Result<Map<String, Value>, SessionError> {
        if self.tokens.current().is_none() {
            return Err(self.reject(SessionError::Unauthenticated));
        }

        let started = self.state.send_if_modified(|state| {
            if !state.phase.can_transition_to(IndexingPhase::Running) {
                return false;
            }
            *state = IndexingState {
                phase: IndexingPhase::Running,
                summary: state.summary.take(),
                failure: None,
            };
            true
        });
        if !started {
            return Err(self.reject(SessionError::IndexingBusy));
        }
        tracing::debug!("indexing started");
        let running = RunningGuard {
            state: &self.state,
            armed: true,
        };

        match self.run().await {
            Ok(summary) => {
                tracing::debug!(documents = summary.len(), "indexing succeeded");
                running.settle(IndexingState {
                    phase: IndexingPhase::Succeeded,
                    summary: Some(summary.clone()),
                    failure: None,
                });
                Ok(summary)
            }
            Err(error) => {
                tracing::warn!(%error, "indexing failed");
                let notification = error.notification();
                running.settle(IndexingState {
                    phase: IndexingPhase::Failed,
                    summary: None,
                    failure: Some(notification.message.clone()),
                });
                self.notifier.notify(notification);
                Err(error)
            }
        }
    }

    async fn run(&self) -> Result<Map<String, Value>, SessionError> {
        let credential = fresh_credential(self.tokens.as_ref()).await?;
        let summary = self.backend.index_new_documents(&credential).await?;
        Ok(summary.document_summary_dict)
    }

    fn reject(&self, error: SessionError) -> SessionError {
        self.notifier.notify(error.notification());
        error
    }
}

/// Leaves `Running` when the pass settles, or as `Failed` if the pass is
/// dropped before it does.
struct RunningGuard<'a> {
    state: &'a watch::Sender<IndexingState>,
    armed: bool,
}

impl RunningGuard<'_> {
    fn settle(mut self, next: IndexingState) {
        self.armed = false;
        self.state.send_replace(next);
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("indexing pass dropped before it settled");
            self.state.send_replace(IndexingState {
                phase: IndexingPhase::Failed,
                summary: None,
                failure: Some(INTERRUPTED.to_string()),
            });
        }
    }
}
