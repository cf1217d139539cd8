//! The query request lifecycle as a pure state machine.
//!
//! [`transition`] maps the current [`QueryRequestState`] and one
//! [`QueryEvent`] to the next state plus the [`Effect`]s the controller must
//! run. It performs no I/O and reads no clock; event timestamps are supplied
//! by the caller.
//!
//! ```text
//! Submitted        any            → awaiting_answer   [RestartClock, StartDots, IssueQuery]
//! AnswerArrived    awaiting_answer → awaiting_images  [StopClock]
//! ImagesDelivered  awaiting_images → complete         [StopDots]
//! RequestFailed    awaiting_answer → failed           [StopClock, StopDots, Notify]
//! ```
//!
//! Events carrying a generation other than the state's are stale and rejected.

use mmrag_core::QueryPhase;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::SessionError;
use crate::notify::Notification;

/// The one live query request cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequestState {
    pub phase: QueryPhase,
    /// Request generation; bumped on every submission.
    pub generation: u64,
    /// Text of the live submission.
    pub query: Option<String>,
    pub answer_text: Option<String>,
    /// Retrieved image URLs, in backend order.
    pub image_references: Vec<String>,
    pub document_reference: Option<String>,
    /// Time spent waiting for the answer, frozen once it arrives or fails.
    pub elapsed_millis: u64,
    /// Seconds from submission to answer arrival, set on completion.
    pub total_seconds: Option<f64>,
    /// Why the request failed, kept inline.
    pub failure: Option<String>,
    #[serde(skip)]
    pub submitted_at: Option<Instant>,
}

#[derive(Debug)]
pub enum QueryEvent {
    Submitted {
        query: String,
        at: Instant,
    },
    AnswerArrived {
        generation: u64,
        answer: String,
        at: Instant,
    },
    ImagesDelivered {
        generation: u64,
        images: Vec<String>,
        document: Option<String>,
        at: Instant,
    },
    RequestFailed {
        generation: u64,
        error: SessionError,
        at: Instant,
    },
}

impl QueryEvent {
    /// Generation the event belongs to; `None` for a new submission.
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::Submitted { .. } => None,
            Self::AnswerArrived { generation, .. }
            | Self::ImagesDelivered { generation, .. }
            | Self::RequestFailed { generation, .. } => Some(*generation),
        }
    }

    const fn target_phase(&self) -> QueryPhase {
        match self {
            Self::Submitted { .. } => QueryPhase::AwaitingAnswer,
            Self::AnswerArrived { .. } => QueryPhase::AwaitingImages,
            Self::ImagesDelivered { .. } => QueryPhase::Complete,
            Self::RequestFailed { .. } => QueryPhase::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    IssueQuery { generation: u64, query: String },
    RestartClock,
    StopClock,
    StartDots,
    StopDots,
    Notify(Notification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: QueryRequestState,
    pub effects: Vec<Effect>,
}

/// Why an event was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// The event belongs to a superseded submission.
    Stale { current: u64, event: u64 },
    /// The event is not valid in the current phase.
    OutOfPhase { from: QueryPhase, to: QueryPhase },
}

/// Apply `event` to `state`.
///
/// # Errors
///
/// Returns [`Rejected`] for stale or out-of-phase events; `state` is then
/// left as it is.
pub fn transition(state: &QueryRequestState, event: QueryEvent) -> Result<Transition, Rejected> {
    if let Some(generation) = event.generation()
        && generation != state.generation
    {
        return Err(Rejected::Stale {
            current: state.generation,
            event: generation,
        });
    }

    let to = event.target_phase();
    if !state.phase.can_transition_to(to) {
        return Err(Rejected::OutOfPhase {
            from: state.phase,
            to,
        });
    }

    let transition = match event {
        QueryEvent::Submitted { query, at } => {
            let generation = state.generation + 1;
            Transition {
                next: QueryRequestState {
                    phase: to,
                    generation,
                    query: Some(query.clone()),
                    submitted_at: Some(at),
                    ..QueryRequestState::default()
                },
                effects: vec![
                    Effect::RestartClock,
                    Effect::StartDots,
                    Effect::IssueQuery { generation, query },
                ],
            }
        }
        QueryEvent::AnswerArrived { answer, at, .. } => Transition {
            next: QueryRequestState {
                phase: to,
                answer_text: Some(answer),
                elapsed_millis: millis_since(state.submitted_at, at),
                ..state.clone()
            },
            effects: vec![Effect::StopClock],
        },
        QueryEvent::ImagesDelivered {
            images,
            document,
            at,
            ..
        } => Transition {
            next: QueryRequestState {
                phase: to,
                image_references: images,
                document_reference: document,
                total_seconds: Some(seconds_since(state.submitted_at, at)),
                ..state.clone()
            },
            effects: vec![Effect::StopDots],
        },
        QueryEvent::RequestFailed { error, at, .. } => {
            let notification = error.notification();
            Transition {
                next: QueryRequestState {
                    phase: to,
                    answer_text: None,
                    image_references: Vec::new(),
                    document_reference: None,
                    elapsed_millis: millis_since(state.submitted_at, at),
                    failure: Some(notification.message.clone()),
                    ..state.clone()
                },
                effects: vec![
                    Effect::StopClock,
                    Effect::StopDots,
                    Effect::Notify(notification),
                ],
            }
        }
    };
    Ok(transition)
}

fn seconds_since(start: Option<Instant>, at: Instant) -> f64 {
    start.map_or(0.0, |start| at.saturating_duration_since(start).as_secs_f64())
}

fn millis_since(start: Option<Instant>, at: Instant) -> u64 {
    start.map_or(0, |start| {
        u64::try_from(at.saturating_duration_since(start).as_millis()).unwrap_or(u64::MAX)
    })
}
