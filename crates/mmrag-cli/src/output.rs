use mmrag_session::{Notification, NotificationKind};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
///
/// `Text` has no generic rendering; commands print their view instead and
/// only reach this for structured output, where it falls back to pretty JSON.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json | OutputFormat::Text => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// One stderr line for a notification.
#[must_use]
pub fn notification_line(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::SignInRequired => "!",
        NotificationKind::Error => "x",
        NotificationKind::Info => "i",
    };
    format!("[{marker}] {notification}")
}
