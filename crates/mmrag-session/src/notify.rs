//! Interrupting user notifications (the terminal's `alert`).

use std::fmt;

use tokio::sync::mpsc;

/// Shown for transport and decoding failures; the detail goes to the log.
pub const GENERIC_FAILURE: &str = "Something went wrong. Check the logs for details.";

/// Shown when a protected action is attempted while signed out.
pub const SIGN_IN_PROMPT: &str = "Please sign in first (`mmrag auth login`).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A protected action needs a signed-in account.
    SignInRequired,
    /// An action failed.
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn sign_in_required() -> Self {
        Self {
            kind: NotificationKind::SignInRequired,
            message: SIGN_IN_PROMPT.to_string(),
        }
    }

    /// `Error: {detail}`, for a backend-provided detail.
    #[must_use]
    pub fn backend_error(detail: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: format!("Error: {detail}"),
        }
    }

    #[must_use]
    pub fn generic_failure() -> Self {
        Self {
            kind: NotificationKind::Error,
            message: GENERIC_FAILURE.to_string(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sending half of the notification queue. Cheap to clone.
///
/// Notifications sent after the receiver is gone are logged and dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        tracing::debug!(kind = ?notification.kind, message = %notification.message, "notify");
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}
