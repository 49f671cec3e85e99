//! Error types for the back office

use std::fmt;

use thiserror::Error;

use crate::types::SessionId;

/// Failures raised by session commands.
///
/// Every variant belongs to the same family so callers can catch all of them
/// at once and still look up a message for the precise kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(SessionId),

    #[error("Cannot delete session {id}: {reason}")]
    CannotDelete { id: SessionId, reason: String },

    #[error("Cannot bulk delete sessions, missing: {0:?}")]
    CannotBulkDelete(Vec<SessionId>),
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::NotFound(_) => SessionErrorKind::NotFound,
            SessionError::CannotDelete { .. } => SessionErrorKind::CannotDelete,
            SessionError::CannotBulkDelete(_) => SessionErrorKind::CannotBulkDelete,
        }
    }
}

/// Discriminant of [`SessionError`], used as a lookup key for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    NotFound,
    CannotDelete,
    CannotBulkDelete,
}

impl SessionErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SessionErrorKind::NotFound => "SessionNotFound",
            SessionErrorKind::CannotDelete => "CannotDeleteSession",
            SessionErrorKind::CannotBulkDelete => "CannotBulkDeleteSessions",
        }
    }

    /// Stable numeric code shown in fallback messages
    pub fn code(&self) -> u16 {
        match self {
            SessionErrorKind::NotFound => 1,
            SessionErrorKind::CannotDelete => 2,
            SessionErrorKind::CannotBulkDelete => 3,
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
