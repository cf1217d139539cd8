use std::fmt;
use std::fs;
use std::path::PathBuf;

use mmrag_core::Account;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const DEFAULT_KEYRING_SERVICE: &str = "mmrag-cli";
const KEYRING_USER: &str = "entra-session";
const SESSION_FILE_NAME: &str = "session.json";

/// What survives between runs: the account and its refresh token.
///
/// Access tokens are never persisted; they are re-minted silently.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub account: Account,
    pub refresh_token: String,
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("account", &self.account)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Identity session cache. Priority: OS keyring → `~/.mmrag/session.json`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    keyring_service: Option<String>,
    file_path: Option<PathBuf>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Keyring-backed store with the home-directory file as fallback.
    ///
    /// The keyring service defaults to `"mmrag-cli"`; override via
    /// `MMRAG_KEYRING_SERVICE` (e.g. `"mmrag-cli-test"`) to avoid touching
    /// real sessions.
    #[must_use]
    pub fn new() -> Self {
        let service = std::env::var("MMRAG_KEYRING_SERVICE")
            .unwrap_or_else(|_| DEFAULT_KEYRING_SERVICE.to_string());
        Self {
            keyring_service: Some(service),
            file_path: dirs::home_dir().map(|h| h.join(".mmrag").join(SESSION_FILE_NAME)),
        }
    }

    /// File-only store at `path` (no keyring access).
    #[must_use]
    pub const fn file_only(path: PathBuf) -> Self {
        Self {
            keyring_service: None,
            file_path: Some(path),
        }
    }

    /// Persist a session. Falls back to the file if the keyring is unavailable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionStore` if both keyring and file storage fail.
    pub fn store(&self, session: &StoredSession) -> Result<(), AuthError> {
        let json = serde_json::to_string(session)
            .map_err(|e| AuthError::SessionStore(format!("serialize session: {e}")))?;

        if let Some(service) = &self.keyring_service {
            match keyring::Entry::new(service, KEYRING_USER) {
                Ok(entry) => match entry.set_password(&json) {
                    Ok(()) => return Ok(()),
                    Err(error) => {
                        tracing::warn!(%error, "keyring store failed; falling back to file");
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "keyring unavailable; falling back to file");
                }
            }
        }

        self.store_file(&json)
    }

    /// Load the cached session, if any.
    #[must_use]
    pub fn load(&self) -> Option<StoredSession> {
        self.load_keyring().or_else(|| self.load_file())
    }

    /// Which tier the cached session came from (for status display).
    #[must_use]
    pub fn detect_source(&self) -> Option<&'static str> {
        if self.load_keyring().is_some() {
            return Some("keyring");
        }
        if self.load_file().is_some() {
            return Some("file");
        }
        None
    }

    // --- Private helpers ---

    fn load_keyring(&self) -> Option<StoredSession> {
        let service = self.keyring_service.as_ref()?;
        let entry = keyring::Entry::new(service, KEYRING_USER).ok()?;
        let json = entry.get_password().ok()?;
        parse_session(&json)
    }

    fn load_file(&self) -> Option<StoredSession> {
        let path = self.file_path.as_ref()?;
        let json = fs::read_to_string(path).ok()?;
        parse_session(&json)
    }

    fn store_file(&self, json: &str) -> Result<(), AuthError> {
        let path = self.file_path.as_ref().ok_or_else(|| {
            AuthError::SessionStore("home directory not found; cannot store session".into())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::SessionStore(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        fs::write(path, json)
            .map_err(|e| AuthError::SessionStore(format!("write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| AuthError::SessionStore(format!("chmod {}: {e}", path.display())))?;
        }

        Ok(())
    }
}

fn parse_session(json: &str) -> Option<StoredSession> {
    if json.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<StoredSession>(json) {
        Ok(session) if !session.refresh_token.is_empty() => Some(session),
        Ok(_) => None,
        Err(error) => {
            tracing::warn!(%error, "ignoring unreadable cached session");
            None
        }
    }
}
