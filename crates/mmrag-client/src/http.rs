//! Shared response handling for backend calls.
//!
//! Every non-success status becomes [`ClientError::Backend`] with the most
//! useful detail the body offers, so the endpoint methods only build requests
//! and decode success bodies.

use mmrag_core::ErrorBody;

use crate::error::ClientError;

/// Return the response unchanged on success, else a [`ClientError::Backend`].
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Backend {
        status: status.as_u16(),
        detail: error_detail(status, &body),
    })
}

/// `{"detail": ...}` when present, else the trimmed body, else the reason phrase.
pub(crate) fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.detail;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}
