//! # mmrag-session
//!
//! Query and indexing lifecycles for the mmrag client.
//!
//! - [`machine`]: the pure query state machine (state + event → state + effects)
//! - [`controller`]: runs it, owning the dots animation and the elapsed clock
//! - [`indexing`]: the document indexing trigger
//! - [`session`]: wires both to one token provider and one backend and
//!   produces [`SessionView`] snapshots for rendering
//!
//! Neither flow makes a network call without a credential; both report
//! failures as [`Notification`]s and never leave a loading phase behind.

pub mod clock;
pub mod controller;
pub mod credential;
pub mod dots;
pub mod error;
pub mod indexing;
pub mod machine;
pub mod notify;
pub mod session;
pub mod ticker;

pub use clock::{ElapsedClock, format_elapsed};
pub use controller::QueryController;
pub use dots::DotsAnimator;
pub use error::SessionError;
pub use indexing::{IndexingState, IndexingTrigger};
pub use machine::{Effect, QueryEvent, QueryRequestState, Transition, transition};
pub use notify::{Notification, NotificationKind, Notifier};
pub use session::{Session, SessionView, SessionWatch};
pub use ticker::Ticker;
