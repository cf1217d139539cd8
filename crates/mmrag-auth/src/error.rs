use thiserror::Error;

/// Token-endpoint error codes that mean "a user must interact".
const INTERACTION_ERRORS: [&str; 4] = [
    "invalid_grant",
    "interaction_required",
    "login_required",
    "consent_required",
];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in failed: {0}")]
    InteractiveFailed(String),

    #[error("silent sign-in unavailable: {0}")]
    SilentUnavailable(String),

    #[error("token endpoint rejected the request: {error}: {description}")]
    TokenEndpoint { error: String, description: String },

    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("invalid redirect URI '{uri}': {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("session store error: {0}")]
    SessionStore(String),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Whether the identity provider asked for user interaction.
    #[must_use]
    pub fn requires_interaction(&self) -> bool {
        match self {
            Self::SilentUnavailable(_) => true,
            Self::TokenEndpoint { error, .. } => INTERACTION_ERRORS.contains(&error.as_str()),
            _ => false,
        }
    }
}
