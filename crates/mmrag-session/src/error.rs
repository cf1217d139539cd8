use mmrag_auth::AuthError;
use mmrag_client::ClientError;

use crate::notify::Notification;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not signed in")]
    Unauthenticated,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("backend error ({status}): {detail}")]
    Backend { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("indexing is already running")]
    IndexingBusy,
}

impl From<ClientError> for SessionError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Backend { status, detail } => Self::Backend { status, detail },
            ClientError::Transport(e) => Self::Transport(e.to_string()),
        }
    }
}

impl SessionError {
    /// What the user is told about this failure.
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            Self::Unauthenticated => Notification::sign_in_required(),
            Self::Auth(e) => Notification::error(format!("Sign-in problem: {e}")),
            Self::Backend { detail, .. } => Notification::backend_error(detail),
            Self::Transport(_) => Notification::generic_failure(),
            Self::IndexingBusy => Notification::info("Indexing is already running."),
        }
    }
}
