//! Backend client error types.

use thiserror::Error;

/// Errors from a call to the RAG backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {detail}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// The body's `detail`, else the raw body, else the status reason.
        detail: String,
    },

    /// The backend was unreachable, timed out, or sent a body that does not
    /// parse.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Status code of a [`ClientError::Backend`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}
