//! Runs the query state machine against real time, tokens and the backend.

use std::sync::Arc;
use std::time::Duration;

use mmrag_auth::TokenProvider;
use mmrag_client::RagBackend;
use mmrag_config::UiConfig;
use mmrag_core::QueryAnswer;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;

use crate::clock::ElapsedClock;
use crate::credential::fresh_credential;
use crate::dots::DotsAnimator;
use crate::error::SessionError;
use crate::machine::{Effect, QueryEvent, QueryRequestState, Rejected, transition};
use crate::notify::Notifier;

/// Owns the live [`QueryRequestState`] and its loading timers.
///
/// Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct QueryController {
    inner: Arc<Inner>,
}

struct Inner {
    tokens: Arc<dyn TokenProvider>,
    backend: Arc<dyn RagBackend>,
    notifier: Notifier,
    state: watch::Sender<QueryRequestState>,
    dots: watch::Receiver<String>,
    elapsed: watch::Receiver<Duration>,
    /// Held for a whole transition so timer effects never interleave.
    timers: Mutex<Timers>,
}

struct Timers {
    dots: DotsAnimator,
    clock: ElapsedClock,
}

impl QueryController {
    #[must_use]
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        backend: Arc<dyn RagBackend>,
        notifier: Notifier,
        ui: &UiConfig,
    ) -> Self {
        let dots = DotsAnimator::new(ui.dots_period());
        let clock = ElapsedClock::new(ui.clock_period());
        let (state, _) = watch::channel(QueryRequestState::default());
        Self {
            inner: Arc::new(Inner {
                tokens,
                backend,
                notifier,
                state,
                dots: dots.subscribe(),
                elapsed: clock.subscribe(),
                timers: Mutex::new(Timers { dots, clock }),
            }),
        }
    }

    /// Submit `query`, superseding any request in flight.
    ///
    /// The state is `AwaitingAnswer` when this returns; the backend call runs
    /// in the background. Returns the new request generation.
    ///
    /// # Errors
    ///
    /// `SessionError::Unauthenticated` without a credential. The user is
    /// prompted to sign in and no request is made.
    pub async fn submit(&self, query: impl Into<String>) -> Result<u64, SessionError> {
        if self.inner.tokens.current().is_none() {
            let error = SessionError::Unauthenticated;
            self.inner.notifier.notify(error.notification());
            return Err(error);
        }

        let event = QueryEvent::Submitted {
            query: query.into(),
            at: Instant::now(),
        };
        let published = self.inner.apply(event).await;
        Ok(published.map_or_else(|| self.state().generation, |state| state.generation))
    }

    #[must_use]
    pub fn state(&self) -> QueryRequestState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueryRequestState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn dots(&self) -> watch::Receiver<String> {
        self.inner.dots.clone()
    }

    #[must_use]
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.inner.elapsed.clone()
    }
}

impl Inner {
    /// Apply one event: timers first, then a single publish, then the rest.
    ///
    /// Returns the published state, or `None` when the event was rejected.
    async fn apply(self: &Arc<Self>, event: QueryEvent) -> Option<QueryRequestState> {
        let mut timers = self.timers.lock().await;

        let result = transition(&self.state.borrow(), event);
        let step = match result {
            Ok(step) => step,
            Err(Rejected::Stale { current, event }) => {
                tracing::debug!(current, stale = event, "dropping superseded completion");
                return None;
            }
            Err(Rejected::OutOfPhase { from, to }) => {
                tracing::debug!(%from, %to, "ignoring out-of-phase event");
                return None;
            }
        };

        let mut deferred = Vec::new();
        for effect in step.effects {
            match effect {
                Effect::RestartClock => timers.clock.restart(),
                Effect::StopClock => timers.clock.stop(),
                Effect::StartDots => timers.dots.start(),
                Effect::StopDots => timers.dots.stop(),
                other => deferred.push(other),
            }
        }

        tracing::debug!(
            phase = %step.next.phase,
            generation = step.next.generation,
            "query state"
        );
        self.state.send_replace(step.next.clone());

        for effect in deferred {
            match effect {
                Effect::Notify(notification) => self.notifier.notify(notification),
                Effect::IssueQuery { generation, query } => self.spawn_query(generation, query),
                _ => {}
            }
        }
        drop(timers);

        Some(step.next)
    }

    fn spawn_query(self: &Arc<Self>, generation: u64, query: String) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.run_query(&query).await;
            let at = Instant::now();
            match outcome {
                Ok(QueryAnswer {
                    response,
                    images,
                    retrieved_document,
                }) => {
                    let answered = QueryEvent::AnswerArrived {
                        generation,
                        answer: response,
                        at,
                    };
                    if inner.apply(answered).await.is_some() {
                        // Let subscribers see AwaitingImages before completion.
                        tokio::task::yield_now().await;
                        let delivered = QueryEvent::ImagesDelivered {
                            generation,
                            images,
                            document: retrieved_document,
                            at,
                        };
                        inner.apply(delivered).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(generation, %error, "query failed");
                    inner
                        .apply(QueryEvent::RequestFailed {
                            generation,
                            error,
                            at,
                        })
                        .await;
                }
            }
        });
    }

    async fn run_query(&self, query: &str) -> Result<QueryAnswer, SessionError> {
        let credential = fresh_credential(self.tokens.as_ref()).await?;
        Ok(self.backend.query(&credential, query).await?)
    }
}
