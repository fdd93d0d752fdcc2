//! Fail-closed access decisions.

use crate::core::FileState;

use serde::{Deserialize, Serialize};

/// Returns `true` if a file in this state may be rendered.
///
/// Only `Clean` permits viewing. Every other state, including the implicit
/// `Unscanned`, denies.
pub fn can_view(state: FileState) -> bool {
    matches!(state, FileState::Clean)
}

/// Returns `true` if a file in this state may be downloaded.
///
/// Same fail-closed rule as [`can_view`].
pub fn can_download(state: FileState) -> bool {
    matches!(state, FileState::Clean)
}

/// The outcome of evaluating the gate for one file state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// The state the decision was made on.
    pub state: FileState,

    /// Whether the file may be rendered.
    pub can_view: bool,

    /// Whether the file may be downloaded.
    pub can_download: bool,
}

impl AccessDecision {
    /// Evaluates the gate for a state.
    pub fn for_state(state: FileState) -> Self {
        Self {
            state,
            can_view: can_view(state),
            can_download: can_download(state),
        }
    }

    /// Returns `true` if any action is permitted.
    pub fn is_allowed(&self) -> bool {
        self.can_view || self.can_download
    }

    /// Returns why access was denied, or `None` if it was granted.
    pub fn denial_reason(&self) -> Option<&'static str> {
        match self.state {
            FileState::Clean => None,
            FileState::Unscanned => Some("file has not been scanned"),
            FileState::Pending => Some("scan in progress"),
            FileState::ScanFailed => Some("last scan attempt failed"),
            FileState::Suspicious => Some("file was flagged as suspicious"),
            FileState::Infected => Some("file is infected"),
        }
    }

    /// Returns `true` if the denial is a hard block rather than "not verified".
    pub fn is_hard_block(&self) -> bool {
        matches!(self.state, FileState::Suspicious | FileState::Infected)
    }
}

impl From<FileState> for AccessDecision {
    fn from(state: FileState) -> Self {
        Self::for_state(state)
    }
}
