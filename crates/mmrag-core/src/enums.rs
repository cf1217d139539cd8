//! Lifecycle phase enums for query requests and document indexing.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Each phase provides `allowed_next_states()` so the session layer can check
//! transitions before applying them.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// QueryPhase
// ---------------------------------------------------------------------------

/// Phase of the live query request.
///
/// ```text
/// idle → awaiting_answer → awaiting_images → complete
///                        → failed
/// (complete | failed | any loading phase) → awaiting_answer   (new submission)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    #[default]
    Idle,
    AwaitingAnswer,
    AwaitingImages,
    Complete,
    Failed,
}

impl QueryPhase {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Idle | Self::Complete | Self::Failed => &[Self::AwaitingAnswer],
            Self::AwaitingAnswer => &[Self::AwaitingAnswer, Self::AwaitingImages, Self::Failed],
            Self::AwaitingImages => &[Self::AwaitingAnswer, Self::Complete],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether a loading banner should be visible.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::AwaitingAnswer | Self::AwaitingImages)
    }

    /// Whether the request cycle has settled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::AwaitingImages => "awaiting_images",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IndexingPhase
// ---------------------------------------------------------------------------

/// Phase of the document-indexing action.
///
/// ```text
/// idle → running → succeeded
///                → failed
/// (succeeded | failed) → running
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingPhase {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl IndexingPhase {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Idle | Self::Succeeded | Self::Failed => &[Self::Running],
            Self::Running => &[Self::Succeeded, Self::Failed],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IndexingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
